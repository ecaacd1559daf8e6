//! TabMosaic: a visual overview of open browser tabs.
//!
//! Entry point: runs a console demo of the full pipeline against the in-memory
//! host. Pass `--verbose` for debug logging and `--persist` to keep settings in
//! the SQLite store under the platform config directory.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tabmosaic::app::{OverviewSurface, SurfaceDeps, TilePreview};
use tabmosaic::database::SqliteStore;
use tabmosaic::managers::selection::NavKey;
use tabmosaic::managers::window_lifecycle::{OverviewController, WindowLifecycleTrait};
use tabmosaic::platform::host::KeyValueStore;
use tabmosaic::platform::memory::{InMemoryHost, MemoryStore};
use tabmosaic::platform::settings_db_path;
use tabmosaic::types::layout::{Container, Viewport};
use tabmosaic::types::preview::{DocumentSnapshot, ImageElement, MetaTag};
use tabmosaic::types::settings::OverviewConfig;
use tabmosaic::types::tab::TabRecord;

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn demo_tabs() -> Vec<TabRecord> {
    let now = now_ms();
    let tab = |id: i64, title: &str, url: &str, minutes_ago: i64, discarded: bool| TabRecord {
        id,
        window_id: 1,
        title: title.to_string(),
        url: url.to_string(),
        favicon_url: Some(format!("{}/favicon.ico", url.trim_end_matches('/'))),
        discarded,
        last_accessed_at: now - minutes_ago * 60_000,
    };
    vec![
        tab(1, "GitHub", "https://github.com", 2, false),
        tab(2, "Rust Programming Language", "https://www.rust-lang.org", 10, false),
        tab(3, "Tokio - An asynchronous Rust runtime", "https://tokio.rs", 90, false),
        tab(4, "Lofi beats", "https://www.youtube.com/watch?v=jfKfPfyJRdk", 5, false),
        tab(5, "Settings", "chrome://settings", 300, false),
        tab(6, "Old article", "https://example.com/article", 600, true),
    ]
}

fn seed_documents(host: &InMemoryHost) {
    host.set_document(
        1,
        DocumentSnapshot {
            url: "https://github.com".to_string(),
            title: "GitHub".to_string(),
            meta: vec![MetaTag {
                property: Some("og:image".to_string()),
                name: None,
                content: Some("/images/modules/open_graph/github-logo.png".to_string()),
            }],
            ..Default::default()
        },
    );
    host.set_document(
        2,
        DocumentSnapshot {
            url: "https://www.rust-lang.org".to_string(),
            title: "Rust Programming Language".to_string(),
            images: vec![ImageElement {
                src: "https://www.rust-lang.org/static/images/rust-social.jpg".to_string(),
                natural_width: 1200,
                natural_height: 630,
                complete: true,
            }],
            ..Default::default()
        },
    );
    host.set_document(
        4,
        DocumentSnapshot {
            url: "https://www.youtube.com/watch?v=jfKfPfyJRdk".to_string(),
            title: "Lofi beats".to_string(),
            ..Default::default()
        },
    );
    // Tab 3 has no document: its capture fails and the tile keeps a placeholder.
}

fn print_tiles(surface: &OverviewSurface) {
    let model = surface.render();
    if let Some(message) = model.empty_message {
        println!("  (empty) {}", message);
        return;
    }
    println!(
        "  {:?} layout, {} columns, content height {:.0}px",
        model.mode, model.columns, model.content_height
    );
    for tile in &model.tiles {
        let preview = match &tile.preview {
            TilePreview::Image(image) => {
                let s = image.as_str();
                format!("image {}", &s[..s.len().min(60)])
            }
            TilePreview::Placeholder(_) => "placeholder".to_string(),
            TilePreview::Text { .. } => "text".to_string(),
        };
        println!(
            "  {} [{:>3}] {:<38} {:>6.0}x{:<5.0} @ ({:.0},{:.0})  {}",
            if tile.selected { "▶" } else { " " },
            tile.tab_id,
            tile.title,
            tile.rect.width,
            tile.rect.height,
            tile.rect.x,
            tile.rect.y,
            preview
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let persist = args.iter().any(|a| a == "--persist");
    tabmosaic::logging::init_logging(verbose);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              TabMosaic v{} - Demo Mode                   ║", env!("CARGO_PKG_VERSION"));
    println!("║        Visual overview of open browser tabs                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let store: Arc<dyn KeyValueStore> = if persist {
        let path = settings_db_path();
        println!("  Settings store: {}", path.display());
        Arc::new(SqliteStore::open(&path).expect("Failed to open settings store"))
    } else {
        Arc::new(MemoryStore::new())
    };

    let host = Arc::new(InMemoryHost::new().with_script_delay(Duration::from_millis(30)));
    host.set_tabs(demo_tabs());
    seed_documents(&host);

    let config = OverviewConfig::default();
    let controller = Arc::new(OverviewController::new(
        host.clone(),
        host.clone(),
        store.clone(),
        &config,
    ));

    section("Window Lifecycle: toggle while absent");
    controller.toggle().await;
    println!("  State: {:?}", controller.state());
    for (id, bounds) in host.popups() {
        println!("  Popup {} at {:?}", id, bounds);
    }
    println!();

    section("Overview surface: grid + lazy captures");
    let deps = SurfaceDeps {
        tabs: host.clone(),
        scripts: host.clone(),
        store: store.clone(),
        controller: controller.clone(),
        fetcher: None,
    };
    let container = Container {
        width: 1200.0,
        height: 800.0,
    };
    let mut surface = OverviewSurface::open(deps, config.clone(), container).await;
    println!(
        "  Capture concurrency: {} (peak so far {})",
        surface.scheduler().limit(),
        host.peak_concurrent_snapshots()
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    surface.poll_captures();
    print_tiles(&surface);
    println!();

    section("Filters");
    surface.set_search_text("rust");
    surface.flush_search().await;
    println!("  search \"rust\":");
    print_tiles(&surface);
    surface.set_search_text("zzz");
    surface.flush_search().await;
    println!("  search \"zzz\":");
    print_tiles(&surface);
    surface.set_search_text("");
    surface.flush_search().await;
    surface.set_show_sleeping(true).await;
    println!("  sleeping tabs shown: {} visible", surface.visible().len());
    println!();

    section("Mosaic layout");
    surface.set_art_mode(true).await;
    print_tiles(&surface);
    surface.set_art_mode(false).await;
    println!();

    section("Keyboard navigation");
    surface.set_viewport(Viewport {
        scroll_top: 0.0,
        height: container.height,
    });
    surface.handle_key(NavKey::Right).await;
    surface.handle_key(NavKey::Right).await;
    println!("  Cursor after → →: {:?}", surface.cursor());
    let effects = surface.handle_key(NavKey::Enter).await;
    println!("  Enter → {:?}", effects);
    println!("  Host saw: {:?}", host.events());
    println!("  Controller state: {:?}", controller.state());
    println!();

    section("Toggle twice: open, then close via the surface");
    controller.toggle().await;
    println!("  After first toggle: {:?}", controller.state());
    controller.toggle().await;
    println!("  After second toggle: {:?}", controller.state());
    println!();

    section("Controller restart recovery");
    controller.toggle().await;
    let restarted = OverviewController::new(host.clone(), host.clone(), store.clone(), &config);
    println!("  Fresh controller starts {:?}", restarted.state());
    restarted.toggle().await;
    println!("  Toggle recovered and closed the window: {:?}", restarted.state());
    println!("  Popups left: {}", host.popups().len());

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ Overview pipeline demonstrated.");
    println!("═══════════════════════════════════════════════════════════════");
}
