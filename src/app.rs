//! Overview surface for TabMosaic.
//!
//! Owns the pipeline of one open overview: registry refresh, filtering,
//! layout, visibility-driven capture scheduling, selection and the render
//! model handed to the view. Every trigger re-runs the pipeline from the
//! point it affects; nothing is patched incrementally.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::managers::selection::{activation_effects, NavKey, Navigator, SelectionEffect};
use crate::managers::tab_registry::{TabRegistry, TabRegistryTrait};
use crate::platform::host::{ControllerLink, KeyValueStore, ScriptHost, TabSource};
use crate::services::capture_scheduler::{CaptureOutcome, CaptureScheduler};
use crate::services::debounce::{Debouncer, Writer};
use crate::services::image_fetcher::ImageFetcher;
use crate::services::placeholder;
use crate::services::preview_resolver::PreviewResolver;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::thumbnail_cache::{CacheKey, ThumbnailCache};
use crate::services::tile_layout::{stagger_delay, TileLayoutEngine, TileLayoutTrait};
use crate::services::visibility::VisibilityTracker;
use crate::types::layout::{Container, Layout, LayoutMode, LayoutRect, Viewport};
use crate::types::message::{ControllerRequest, SurfaceRequest, SurfaceResponse};
use crate::types::preview::{ImageRef, PreviewResult};
use crate::types::settings::{OverviewConfig, OverviewSettings};
use crate::types::tab::{FilterCriteria, TabRecord, VisibleSet, WindowScope};

pub const NO_TABS_MESSAGE: &str = "No tabs found. Please check permissions.";
pub const NO_MATCHES_MESSAGE: &str = "No tabs match current filters.";

/// Host capabilities the surface runs against.
#[derive(Clone)]
pub struct SurfaceDeps {
    pub tabs: Arc<dyn TabSource>,
    pub scripts: Arc<dyn ScriptHost>,
    pub store: Arc<dyn KeyValueStore>,
    pub controller: Arc<dyn ControllerLink>,
    pub fetcher: Option<Arc<dyn ImageFetcher>>,
}

/// What a tile currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum TilePreview {
    /// Captured preview.
    Image(ImageRef),
    /// Synthesized card; shown while loading and when capture was unavailable.
    Placeholder(ImageRef),
    /// Thumbnails switched off: title on a hostname-derived gradient.
    Text { gradient: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub index: usize,
    pub tab_id: i64,
    pub title: String,
    pub hostname: String,
    pub url: String,
    pub favicon: Option<String>,
    pub discarded: bool,
    pub rect: LayoutRect,
    pub preview: TilePreview,
    pub selected: bool,
    pub stagger: Duration,
}

/// Everything the view needs for one paint.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub empty_message: Option<&'static str>,
    pub tiles: Vec<TileView>,
    pub mode: LayoutMode,
    pub columns: usize,
    pub content_height: f64,
    pub cursor: isize,
}

pub struct OverviewSurface {
    deps: SurfaceDeps,
    config: OverviewConfig,
    settings_engine: SettingsEngine,
    settings: OverviewSettings,
    registry: TabRegistry,
    layout_engine: TileLayoutEngine,
    scheduler: CaptureScheduler,
    outcomes: mpsc::UnboundedReceiver<CaptureOutcome>,
    visibility: VisibilityTracker,
    navigator: Navigator,
    search_text: String,
    search: Debouncer<String>,
    search_updates: mpsc::UnboundedReceiver<String>,
    visible: VisibleSet,
    layout: Layout,
    container: Container,
    viewport: Viewport,
    previews: HashMap<CacheKey, TilePreview>,
    closing: bool,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl OverviewSurface {
    /// Builds the surface, loads settings and runs the first refresh.
    /// Must be called inside a Tokio runtime.
    pub async fn open(deps: SurfaceDeps, config: OverviewConfig, container: Container) -> Self {
        let cache = Arc::new(ThumbnailCache::new(config.cache_ttl));
        Self::open_with_cache(deps, config, container, cache).await
    }

    /// Like [`OverviewSurface::open`], sharing an existing thumbnail cache.
    pub async fn open_with_cache(
        deps: SurfaceDeps,
        config: OverviewConfig,
        container: Container,
        cache: Arc<ThumbnailCache>,
    ) -> Self {
        let mut settings_engine = SettingsEngine::new(deps.store.clone());
        let settings = match settings_engine.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "settings unavailable, using defaults");
                OverviewSettings::default()
            }
        };

        let (scheduler, outcomes) = CaptureScheduler::new(
            PreviewResolver::new(),
            deps.scripts.clone(),
            cache,
            deps.fetcher.clone(),
            config.capture_concurrency,
        );

        let (search_tx, search_updates) = mpsc::unbounded_channel();
        let search_writer: Writer<String> = Arc::new(move |text| {
            let tx = search_tx.clone();
            Box::pin(async move {
                let _ = tx.send(text);
            })
        });

        let mut surface = Self {
            search: Debouncer::new(config.search_debounce, search_writer),
            search_updates,
            registry: TabRegistry::new(deps.tabs.clone()),
            layout_engine: TileLayoutEngine::new(config.grid.clone()),
            visibility: VisibilityTracker::new(config.lookahead_margin),
            viewport: Viewport {
                scroll_top: 0.0,
                height: container.height,
            },
            deps,
            config,
            settings_engine,
            settings,
            scheduler,
            outcomes,
            navigator: Navigator::new(),
            search_text: String::new(),
            visible: VisibleSet::default(),
            layout: Layout::default(),
            container,
            previews: HashMap::new(),
            closing: false,
        };
        surface.refresh().await;
        info!(tabs = surface.visible.len(), "overview opened");
        surface
    }

    // === Pipeline ===

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_text: self.search_text.clone(),
            hide_discarded: !self.settings.show_sleeping,
            window_scope: if self.settings.show_all_windows {
                WindowScope::AllWindows
            } else {
                WindowScope::CurrentWindowOnly
            },
        }
    }

    pub fn mode(&self) -> LayoutMode {
        if self.settings.art_mode {
            LayoutMode::Mosaic
        } else {
            LayoutMode::Grid
        }
    }

    /// Re-queries the host and re-runs filter, layout and visibility.
    pub async fn refresh(&mut self) {
        if self.closing {
            return;
        }
        let criteria = self.criteria();
        self.visible = self.registry.refresh(&criteria).await;
        self.relayout();
    }

    /// Re-filters the last snapshot without querying the host.
    fn refilter(&mut self) {
        self.visible = self.registry.apply_filters(&self.criteria());
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = self.layout_engine.layout(
            self.mode(),
            self.visible.as_slice(),
            self.container,
            now_ms(),
        );
        self.navigator.set_len(self.visible.len());

        let visible = &self.visible;
        self.previews
            .retain(|key, _| visible.contains(key.tab_id, &key.url));

        if self.settings.show_thumbnails && !self.closing {
            self.visibility.observe(&self.layout.rects);
            self.dispatch_visible();
        } else {
            self.visibility.disconnect();
        }
        debug!(
            visible = self.visible.len(),
            columns = self.layout.columns,
            mode = ?self.layout.mode,
            "layout pass"
        );
    }

    fn dispatch_visible(&mut self) {
        for index in self.visibility.update(self.viewport) {
            if let Some(tab) = self.visible.get(index) {
                self.scheduler.request(tab);
            }
        }
    }

    // === Inputs ===

    /// Search box input. The filter follows once typing pauses for
    /// `search_debounce`; see [`OverviewSurface::poll_search`].
    pub fn set_search_text(&mut self, text: &str) {
        if self.closing {
            return;
        }
        self.search.schedule(text.to_string());
    }

    /// Applies the settled search text, if any. Returns whether the filter changed.
    pub fn poll_search(&mut self) -> bool {
        let mut latest = None;
        while let Ok(text) = self.search_updates.try_recv() {
            latest = Some(text);
        }
        match latest {
            Some(text) if text != self.search_text && !self.closing => {
                self.search_text = text;
                self.refilter();
                true
            }
            _ => false,
        }
    }

    /// Applies pending search input without waiting for the pause (Enter in the box).
    pub async fn flush_search(&mut self) -> bool {
        self.search.flush().await;
        self.poll_search()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.closing {
            self.dispatch_visible();
        }
    }

    pub fn resize(&mut self, container: Container) {
        self.container = container;
        self.viewport.height = container.height;
        self.relayout();
    }

    async fn persist_setting(&mut self, key: &str, value: bool) {
        if let Err(e) = self.settings_engine.set_value(key, Value::Bool(value)).await {
            warn!(key, error = %e, "failed to persist setting");
        }
    }

    pub async fn set_show_sleeping(&mut self, show: bool) {
        self.settings.show_sleeping = show;
        self.persist_setting("showSleeping", show).await;
        self.refilter();
    }

    pub async fn set_show_all_windows(&mut self, show: bool) {
        self.settings.show_all_windows = show;
        self.persist_setting("showAllWindows", show).await;
        self.refilter();
    }

    pub async fn set_art_mode(&mut self, enabled: bool) {
        self.settings.art_mode = enabled;
        self.persist_setting("artMode", enabled).await;
        self.relayout();
    }

    pub async fn set_show_thumbnails(&mut self, show: bool) {
        self.settings.show_thumbnails = show;
        self.persist_setting("showThumbnails", show).await;
        self.relayout();
    }

    pub fn hover(&mut self, index: usize) {
        self.navigator.hover(index);
    }

    pub fn mouse_leave(&mut self) {
        self.navigator.mouse_leave();
    }

    /// Keyboard input. Returns the effects that were executed.
    pub async fn handle_key(&mut self, key: NavKey) -> Vec<SelectionEffect> {
        if self.closing {
            return Vec::new();
        }
        let effects = self
            .navigator
            .handle_key(key, self.layout.columns, &self.visible);
        self.execute_effects(&effects).await;
        effects
    }

    /// Keyboard input by DOM key name; unknown keys are ignored.
    pub async fn handle_key_name(&mut self, name: &str) -> Vec<SelectionEffect> {
        match NavKey::from_key_name(name) {
            Some(key) => self.handle_key(key).await,
            None => Vec::new(),
        }
    }

    /// Click on tile `index`.
    pub async fn click(&mut self, index: usize) -> Vec<SelectionEffect> {
        if self.closing {
            return Vec::new();
        }
        let Some(tab) = self.visible.get(index) else {
            return Vec::new();
        };
        let effects = activation_effects(tab.id, tab.window_id);
        self.execute_effects(&effects).await;
        effects
    }

    async fn execute_effects(&mut self, effects: &[SelectionEffect]) {
        for effect in effects {
            match *effect {
                SelectionEffect::ActivateTab { tab_id, window_id } => {
                    if let Err(e) = self.deps.tabs.activate_tab(tab_id).await {
                        warn!(tab_id, error = %e, "tab activation failed");
                    }
                    if let Err(e) = self.deps.tabs.focus_window(window_id).await {
                        warn!(window_id, error = %e, "window focus failed");
                    }
                }
                SelectionEffect::CloseOverview => {
                    self.begin_close();
                    if let Err(e) = self
                        .deps
                        .controller
                        .send(ControllerRequest::CloseOverviewWindow)
                        .await
                    {
                        warn!(error = %e, "controller unreachable while closing");
                    }
                }
            }
        }
    }

    /// Asks the controller to forget stored geometry and re-place the window.
    pub async fn reset_window_bounds(&self) {
        if let Err(e) = self
            .deps
            .controller
            .send(ControllerRequest::ResetWindowBounds)
            .await
        {
            warn!(error = %e, "controller unreachable for bounds reset");
        }
    }

    /// Controller → surface messages. The toggle shortcut closes the surface;
    /// the host closes the window once the response reports `closing`.
    pub fn handle_request(&mut self, request: SurfaceRequest) -> SurfaceResponse {
        debug!(?request, "surface request");
        self.begin_close();
        SurfaceResponse {
            ok: true,
            closing: true,
        }
    }

    /// Stops new captures. In-flight ones finish and are discarded.
    fn begin_close(&mut self) {
        if self.closing {
            return;
        }
        self.closing = true;
        self.search.cancel();
        self.visibility.disconnect();
        self.scheduler.shutdown();
        info!("overview closing");
    }

    // === Capture results ===

    fn apply_outcome(&mut self, outcome: CaptureOutcome) -> bool {
        if self.closing || !self.visible.contains(outcome.key.tab_id, &outcome.key.url) {
            debug!(tab_id = outcome.key.tab_id, "discarding capture for a tile no longer shown");
            return false;
        }
        let preview = match outcome.result {
            PreviewResult::Image(image) => TilePreview::Image(image.image),
            PreviewResult::Unavailable(reason) => {
                debug!(tab_id = outcome.key.tab_id, ?reason, "preview unavailable");
                let Some(tab) = self
                    .visible
                    .position(outcome.key.tab_id)
                    .and_then(|i| self.visible.get(i))
                else {
                    return false;
                };
                TilePreview::Placeholder(placeholder::synthesize(tab.display_title(), &tab.hostname()))
            }
        };
        self.previews.insert(outcome.key, preview);
        true
    }

    /// Applies every capture result that has arrived. Returns how many were applied.
    pub fn poll_captures(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            if self.apply_outcome(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next capture result. `None` once the scheduler is gone.
    pub async fn next_capture(&mut self) -> Option<CacheKey> {
        loop {
            let outcome = self.outcomes.recv().await?;
            let key = outcome.key.clone();
            if self.apply_outcome(outcome) {
                return Some(key);
            }
        }
    }

    // === Accessors ===

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn settings(&self) -> &OverviewSettings {
        &self.settings
    }

    pub fn config(&self) -> &OverviewConfig {
        &self.config
    }

    pub fn cursor(&self) -> Option<usize> {
        self.navigator.cursor()
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn scheduler(&self) -> &CaptureScheduler {
        &self.scheduler
    }

    pub fn preview_for(&self, tab: &TabRecord) -> Option<&TilePreview> {
        self.previews.get(&CacheKey::for_tab(tab))
    }

    // === Render ===

    pub fn render(&self) -> RenderModel {
        let empty_message = if self.registry.all_tabs().is_empty() {
            Some(NO_TABS_MESSAGE)
        } else if self.visible.is_empty() {
            Some(NO_MATCHES_MESSAGE)
        } else {
            None
        };

        let cursor = self.navigator.cursor();
        let tiles = self
            .visible
            .iter()
            .zip(self.layout.rects.iter())
            .enumerate()
            .map(|(index, (tab, rect))| {
                let hostname = tab.hostname();
                let preview = if !self.settings.show_thumbnails {
                    TilePreview::Text {
                        gradient: placeholder::text_gradient(&hostname),
                    }
                } else {
                    self.previews
                        .get(&CacheKey::for_tab(tab))
                        .cloned()
                        .unwrap_or_else(|| {
                            TilePreview::Placeholder(placeholder::synthesize(
                                tab.display_title(),
                                &hostname,
                            ))
                        })
                };
                TileView {
                    index,
                    tab_id: tab.id,
                    title: tab.display_title().to_string(),
                    url: tab.url.clone(),
                    favicon: tab.usable_favicon().map(str::to_string),
                    discarded: tab.discarded,
                    rect: *rect,
                    preview,
                    selected: cursor == Some(index),
                    stagger: stagger_delay(index),
                    hostname,
                }
            })
            .collect();

        RenderModel {
            empty_message,
            tiles,
            mode: self.layout.mode,
            columns: self.layout.columns,
            content_height: self.layout.content_height,
            cursor: self.navigator.cursor_value(),
        }
    }
}
