use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::window::WindowBounds;

/// Persisted user settings. Serialises to the key-value blob shared with the host:
/// `{ overviewBounds, showSleeping, showAllWindows, artMode, showThumbnails }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OverviewSettings {
    pub overview_bounds: Option<WindowBounds>,
    pub show_sleeping: bool,
    pub show_all_windows: bool,
    pub art_mode: bool,
    pub show_thumbnails: bool,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self {
            overview_bounds: None,
            show_sleeping: false,
            show_all_windows: false,
            art_mode: false,
            show_thumbnails: true,
        }
    }
}

impl OverviewSettings {
    /// Storage keys, in blob order.
    pub const KEYS: [&'static str; 5] = [
        "overviewBounds",
        "showSleeping",
        "showAllWindows",
        "artMode",
        "showThumbnails",
    ];
}

/// Key under which the open overview window's id is persisted across controller restarts.
pub const WINDOW_ID_KEY: &str = "overviewWindowId";

/// Runtime tunables. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewConfig {
    pub cache_ttl: Duration,
    /// Extra pixels below the fold that still count as visible.
    pub lookahead_margin: f64,
    pub capture_concurrency: usize,
    pub geometry_debounce: Duration,
    /// Pause in typing before the search filter is re-applied.
    pub search_debounce: Duration,
    pub grid: GridConfig,
    pub geometry: GeometryConfig,
    /// Upper bound for inlined preview images.
    pub max_inline_bytes: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            lookahead_margin: 300.0,
            capture_concurrency: default_capture_concurrency(),
            geometry_debounce: Duration::from_millis(200),
            search_debounce: Duration::from_millis(150),
            grid: GridConfig::default(),
            geometry: GeometryConfig::default(),
            max_inline_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Half the logical cores, clamped to `2..=4`.
pub fn default_capture_concurrency() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    (cores / 2).clamp(2, 4)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub min_tile_width: f64,
    pub tile_height: f64,
    pub gap: f64,
    /// Mosaic height per tile, relative to grid tile height.
    pub mosaic_density: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_tile_width: 240.0,
            tile_height: 200.0,
            gap: 12.0,
            mosaic_density: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    pub width_fraction: f64,
    pub height_fraction: f64,
    pub max_width: i32,
    pub max_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    /// Used when the display cannot be queried.
    pub fallback: WindowBounds,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            width_fraction: 0.88,
            height_fraction: 0.90,
            max_width: 1600,
            max_height: 1000,
            min_width: 480,
            min_height: 360,
            fallback: WindowBounds {
                width: 1024,
                height: 800,
                top: 80,
                left: 80,
            },
        }
    }
}
