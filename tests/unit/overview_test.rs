//! Unit tests for the overview surface pipeline: empty states, filters,
//! lazy capture, stale results, selection effects and teardown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use tabmosaic::app::{
    OverviewSurface, SurfaceDeps, TilePreview, NO_MATCHES_MESSAGE, NO_TABS_MESSAGE,
};
use tabmosaic::managers::selection::{NavKey, SelectionEffect};
use tabmosaic::platform::host::{ControllerLink, KeyValueStore};
use tabmosaic::platform::memory::{HostEvent, InMemoryHost, MemoryStore};
use tabmosaic::types::errors::HostError;
use tabmosaic::types::layout::{Container, LayoutMode, Viewport};
use tabmosaic::types::message::{ControllerRequest, SurfaceRequest};
use tabmosaic::types::preview::{DocumentSnapshot, ImageRef, MetaTag};
use tabmosaic::types::settings::OverviewConfig;
use tabmosaic::types::tab::TabRecord;

const CONTAINER: Container = Container {
    width: 1008.0,
    height: 600.0,
};

/// Records controller requests together with how many host events had
/// happened when each arrived.
struct RecordingController {
    host: Arc<InMemoryHost>,
    sent: Mutex<Vec<(ControllerRequest, usize)>>,
}

impl RecordingController {
    fn new(host: &Arc<InMemoryHost>) -> Arc<Self> {
        Arc::new(Self {
            host: host.clone(),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<(ControllerRequest, usize)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControllerLink for RecordingController {
    async fn send(&self, request: ControllerRequest) -> Result<(), HostError> {
        let seen = self.host.events().len();
        self.sent.lock().unwrap().push((request, seen));
        Ok(())
    }
}

fn tab(id: i64, window_id: i64, title: &str, url: &str, last: i64) -> TabRecord {
    TabRecord {
        id,
        window_id,
        title: title.to_string(),
        url: url.to_string(),
        favicon_url: Some(format!("{}favicon.ico", url)),
        discarded: false,
        last_accessed_at: last,
    }
}

fn og_document(url: &str) -> DocumentSnapshot {
    DocumentSnapshot {
        url: url.to_string(),
        title: "Doc".to_string(),
        meta: vec![MetaTag {
            property: Some("og:image".to_string()),
            name: None,
            content: Some(format!("{}og.png", url)),
        }],
        ..Default::default()
    }
}

struct Fixture {
    host: Arc<InMemoryHost>,
    store: Arc<MemoryStore>,
    controller: Arc<RecordingController>,
}

impl Fixture {
    fn new(tabs: Vec<TabRecord>) -> Self {
        Self::with_delay(tabs, Duration::ZERO)
    }

    fn with_delay(tabs: Vec<TabRecord>, delay: Duration) -> Self {
        let host = Arc::new(InMemoryHost::new().with_script_delay(delay));
        for t in &tabs {
            host.set_document(t.id, og_document(&t.url));
        }
        host.set_tabs(tabs);
        let controller = RecordingController::new(&host);
        Self {
            host,
            store: Arc::new(MemoryStore::new()),
            controller,
        }
    }

    fn deps(&self) -> SurfaceDeps {
        SurfaceDeps {
            tabs: self.host.clone(),
            scripts: self.host.clone(),
            store: self.store.clone(),
            controller: self.controller.clone(),
            fetcher: None,
        }
    }

    async fn open(&self) -> OverviewSurface {
        OverviewSurface::open(self.deps(), OverviewConfig::default(), CONTAINER).await
    }
}

fn three_tabs() -> Vec<TabRecord> {
    vec![
        tab(1, 1, "GitHub", "https://github.com/", 100),
        tab(2, 1, "Rust docs", "https://doc.rust-lang.org/", 300),
        tab(3, 1, "News", "https://news.test/", 200),
    ]
}

async fn drain(surface: &mut OverviewSurface, n: usize) {
    for _ in 0..n {
        surface.next_capture().await.expect("capture channel closed");
    }
}

// === Empty states ===

#[tokio::test(start_paused = true)]
async fn test_no_tabs_message() {
    let fx = Fixture::new(Vec::new());
    let surface = fx.open().await;

    let model = surface.render();
    assert_eq!(model.empty_message, Some(NO_TABS_MESSAGE));
    assert!(model.tiles.is_empty());
    assert_eq!(model.cursor, -1);
}

#[tokio::test(start_paused = true)]
async fn test_enumeration_failure_shows_no_tabs_message() {
    let fx = Fixture::new(three_tabs());
    fx.host.fail_tab_query(true);
    let surface = fx.open().await;
    assert_eq!(surface.render().empty_message, Some(NO_TABS_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn test_no_matches_message() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    surface.set_search_text("does-not-exist");
    surface.flush_search().await;

    surface.flush_search().await;
    let model = surface.render();
    assert_eq!(model.empty_message, Some(NO_MATCHES_MESSAGE));
    assert!(model.tiles.is_empty());

    surface.set_search_text("");
    surface.flush_search().await;

    surface.flush_search().await;
    assert_eq!(surface.render().empty_message, None);
}

// === Filters and settings ===

#[tokio::test(start_paused = true)]
async fn test_defaults_hide_sleeping_and_other_windows() {
    let mut tabs = three_tabs();
    tabs.push(tab(4, 2, "Elsewhere", "https://other.test/", 900));
    let mut sleeping = tab(5, 1, "Asleep", "https://sleep.test/", 950);
    sleeping.discarded = true;
    tabs.push(sleeping);
    let fx = Fixture::new(tabs);
    let mut surface = fx.open().await;

    let ids: Vec<i64> = surface.visible().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    surface.set_show_sleeping(true).await;
    surface.set_show_all_windows(true).await;
    let ids: Vec<i64> = surface.visible().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![5, 4, 2, 3, 1]);

    assert_eq!(fx.store.raw("showSleeping"), Some(json!(true)));
    assert_eq!(fx.store.raw("showAllWindows"), Some(json!(true)));
}

#[tokio::test(start_paused = true)]
async fn test_settings_loaded_on_open() {
    let fx = Fixture::new(three_tabs());
    fx.store.set("artMode", json!(true)).await.unwrap();
    let surface = fx.open().await;

    assert!(surface.settings().art_mode);
    assert_eq!(surface.layout().mode, LayoutMode::Mosaic);
}

#[tokio::test(start_paused = true)]
async fn test_art_mode_toggle_relayouts() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;
    assert_eq!(surface.render().mode, LayoutMode::Grid);

    surface.set_art_mode(true).await;
    let model = surface.render();
    assert_eq!(model.mode, LayoutMode::Mosaic);
    assert_eq!(model.tiles.len(), 3);
    assert_eq!(fx.store.raw("artMode"), Some(json!(true)));
}

#[tokio::test(start_paused = true)]
async fn test_broken_store_uses_defaults() {
    let fx = Fixture::new(three_tabs());
    fx.store.fail(true);
    let mut surface = fx.open().await;

    assert!(surface.settings().show_thumbnails);
    surface.set_art_mode(true).await;
    assert_eq!(surface.layout().mode, LayoutMode::Mosaic);
}

// === Captures ===

#[tokio::test(start_paused = true)]
async fn test_captures_fill_tiles() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    let first = surface.render();
    assert!(first
        .tiles
        .iter()
        .all(|t| matches!(t.preview, TilePreview::Placeholder(_))));

    drain(&mut surface, 3).await;
    let model = surface.render();
    let github = model.tiles.iter().find(|t| t.tab_id == 1).unwrap();
    assert_eq!(
        github.preview,
        TilePreview::Image(ImageRef::Remote("https://github.com/og.png".to_string()))
    );
    assert_eq!(github.hostname, "github.com");
    assert_eq!(github.favicon.as_deref(), Some("https://github.com/favicon.ico"));
}

#[tokio::test(start_paused = true)]
async fn test_privileged_page_gets_placeholder_without_probe() {
    let mut tabs = three_tabs();
    tabs.push(tab(9, 1, "Settings", "chrome://settings", 50));
    let fx = Fixture::new(tabs);
    let mut surface = fx.open().await;

    drain(&mut surface, 4).await;
    let settings_tab = surface.visible().iter().find(|t| t.id == 9).unwrap().clone();
    assert!(matches!(
        surface.preview_for(&settings_tab),
        Some(TilePreview::Placeholder(ImageRef::Inline(_)))
    ));
    assert_eq!(fx.host.snapshot_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_only_tiles_near_viewport_are_captured() {
    let tabs: Vec<TabRecord> = (1..=40)
        .map(|i| tab(i, 1, &format!("Tab {}", i), &format!("https://t{}.test/", i), 1000 - i))
        .collect();
    let fx = Fixture::new(tabs);
    let mut surface = fx.open().await;

    // Rows start every 212px; the 600px viewport plus 300px lookahead reaches five rows.
    drain(&mut surface, 20).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fx.host.snapshot_calls(), 20);

    surface.set_viewport(Viewport {
        scroll_top: 1060.0,
        height: 600.0,
    });
    drain(&mut surface, 20).await;
    assert_eq!(fx.host.snapshot_calls(), 40);
}

#[tokio::test(start_paused = true)]
async fn test_stale_results_are_discarded() {
    let fx = Fixture::with_delay(three_tabs(), Duration::from_millis(100));
    let mut surface = fx.open().await;

    surface.set_search_text("github");
    surface.flush_search().await;

    surface.flush_search().await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(surface.poll_captures(), 1);
    let news = tab(3, 1, "News", "https://news.test/", 200);
    assert!(surface.preview_for(&news).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_thumbnails_off_renders_text_tiles() {
    let fx = Fixture::new(three_tabs());
    fx.store.set("showThumbnails", json!(false)).await.unwrap();
    let surface = fx.open().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fx.host.snapshot_calls(), 0);
    let model = surface.render();
    assert!(model
        .tiles
        .iter()
        .all(|t| matches!(&t.preview, TilePreview::Text { gradient } if gradient.starts_with("linear-gradient"))));
}

// === Selection ===

#[tokio::test(start_paused = true)]
async fn test_enter_activates_before_closing() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    surface.handle_key(NavKey::Down).await;
    surface.handle_key(NavKey::Right).await;
    assert_eq!(surface.cursor(), Some(1));
    assert!(surface.render().tiles[1].selected);

    let effects = surface.handle_key_name("Enter").await;
    // Visible order is recency: [2, 3, 1].
    assert_eq!(
        effects,
        vec![
            SelectionEffect::ActivateTab {
                tab_id: 3,
                window_id: 1
            },
            SelectionEffect::CloseOverview,
        ]
    );
    assert_eq!(
        fx.host.events(),
        vec![HostEvent::TabActivated(3), HostEvent::WindowFocused(1)]
    );
    assert_eq!(
        fx.controller.sent(),
        vec![(ControllerRequest::CloseOverviewWindow, 2)]
    );
    assert!(surface.is_closing());
    assert!(surface.scheduler().is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_click_activates_tile() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    let effects = surface.click(2).await;
    assert_eq!(effects[0], SelectionEffect::ActivateTab { tab_id: 1, window_id: 1 });
    assert_eq!(fx.host.events()[0], HostEvent::TabActivated(1));
    assert!(surface.click(0).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_escape_closes_without_activation() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    let effects = surface.handle_key(NavKey::Escape).await;
    assert_eq!(effects, vec![SelectionEffect::CloseOverview]);
    assert!(fx.host.events().is_empty());
    assert_eq!(
        fx.controller.sent(),
        vec![(ControllerRequest::CloseOverviewWindow, 0)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_enter_without_selection_does_nothing() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    assert!(surface.handle_key(NavKey::Enter).await.is_empty());
    assert!(!surface.is_closing());
    assert!(fx.controller.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_clamps_cursor() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    surface.hover(2);
    surface.set_search_text("rust");
    surface.flush_search().await;
    assert_eq!(surface.cursor(), Some(0));

    surface.set_search_text("zzz");
    surface.flush_search().await;

    surface.flush_search().await;
    assert_eq!(surface.cursor(), None);
    assert_eq!(surface.render().cursor, -1);
}

#[tokio::test(start_paused = true)]
async fn test_search_waits_for_typing_to_pause() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    for text in ["r", "ru", "rus", "rust"] {
        surface.set_search_text(text);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!surface.poll_search());
    }
    assert_eq!(surface.visible().len(), 3);
    assert_eq!(surface.criteria().search_text, "");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(surface.poll_search());
    assert_eq!(surface.criteria().search_text, "rust");
    assert!(surface.visible().len() < 3);

    surface.set_search_text("rust");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!surface.poll_search());
}

#[tokio::test(start_paused = true)]
async fn test_close_drops_pending_search() {
    let fx = Fixture::new(three_tabs());
    let mut surface = fx.open().await;

    surface.set_search_text("zzz");
    surface.handle_key(NavKey::Escape).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!surface.poll_search());
    assert_eq!(surface.visible().len(), 3);
}

// === Teardown ===

#[tokio::test(start_paused = true)]
async fn test_surface_request_closes() {
    let fx = Fixture::with_delay(three_tabs(), Duration::from_millis(100));
    let mut surface = fx.open().await;

    let response = surface.handle_request(SurfaceRequest::HandleShortcut);
    assert!(response.ok);
    assert!(response.closing);
    assert!(surface.is_closing());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(surface.poll_captures(), 0);
    assert!(surface.handle_key(NavKey::Escape).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reset_bounds_forwarded_to_controller() {
    let fx = Fixture::new(three_tabs());
    let surface = fx.open().await;

    surface.reset_window_bounds().await;
    assert_eq!(
        fx.controller.sent(),
        vec![(ControllerRequest::ResetWindowBounds, 0)]
    );
}
