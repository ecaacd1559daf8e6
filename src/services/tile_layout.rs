//! Tile Layout Engine.
//!
//! Two placements over the visible set, both fully recomputed on every pass:
//!
//! - **Grid**: equal tiles in reading order. The column count follows the
//!   container width.
//! - **Mosaic**: a squarified treemap. Each tab gets a weight from recency and
//!   activity, and the container is partitioned into rectangles whose areas
//!   are proportional to those weights.
//!
//! Rects are returned in visible-set order regardless of how the treemap
//! sorted them internally.

use std::time::Duration;

use crate::types::layout::{Container, Layout, LayoutMode, LayoutRect};
use crate::types::settings::GridConfig;
use crate::types::tab::TabRecord;

pub const BASE_WEIGHT: f64 = 1.0;
pub const RECENCY_BONUS: f64 = 1.0;
pub const ACTIVITY_BONUS: f64 = 0.5;
pub const RECENCY_WINDOW_MS: i64 = 60 * 60 * 1000;

const STAGGER_STEP: Duration = Duration::from_millis(20);
const STAGGER_CYCLE: usize = 10;

/// Mosaic tilt, cycled by index. Degrees.
const TILT: [f64; 4] = [-0.6, 0.4, -0.3, 0.5];

/// Animation delay for the tile at `index`.
pub fn stagger_delay(index: usize) -> Duration {
    STAGGER_STEP * (index % STAGGER_CYCLE) as u32
}

/// Mosaic weight of a tab at wall-clock time `now_ms`.
pub fn tab_weight(tab: &TabRecord, now_ms: i64) -> f64 {
    let mut weight = BASE_WEIGHT;
    if now_ms.saturating_sub(tab.last_accessed_at) < RECENCY_WINDOW_MS {
        weight += RECENCY_BONUS;
    }
    if !tab.discarded {
        weight += ACTIVITY_BONUS;
    }
    weight
}

/// Columns that fit `width` at the configured minimum tile width. Never zero.
pub fn grid_columns(width: f64, config: &GridConfig) -> usize {
    let per_column = config.min_tile_width + config.gap;
    if !(width.is_finite() && per_column > 0.0) {
        return 1;
    }
    (((width + config.gap) / per_column).floor() as usize).max(1)
}

// === Squarified treemap ===

/// Axis-aligned area being partitioned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Worst aspect ratio of a row of areas laid along `side`. Lower is better.
pub fn worst_ratio(row: &[f64], side: f64) -> f64 {
    if row.is_empty() || side <= 0.0 {
        return f64::INFINITY;
    }
    let sum: f64 = row.iter().sum();
    let max = row.iter().copied().fold(f64::MIN, f64::max);
    let min = row.iter().copied().fold(f64::MAX, f64::min);
    let side_sq = side * side;
    let sum_sq = sum * sum;
    (side_sq * max / sum_sq).max(sum_sq / (side_sq * min))
}

/// Partitions `bounds` into one rect per weight, areas proportional to weight.
/// Output order matches `weights`.
pub fn squarify(weights: &[f64], bounds: Bounds) -> Vec<Bounds> {
    let n = weights.len();
    let empty = Bounds {
        x: bounds.x,
        y: bounds.y,
        width: 0.0,
        height: 0.0,
    };
    if n == 0 {
        return Vec::new();
    }
    if !(bounds.width > 0.0 && bounds.height > 0.0) {
        return vec![empty; n];
    }

    // Non-positive or non-finite weights count as the smallest valid one.
    let floor = weights
        .iter()
        .copied()
        .filter(|w| w.is_finite() && *w > 0.0)
        .fold(f64::MAX, f64::min);
    let floor = if floor == f64::MAX { 1.0 } else { floor };
    let clean: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { floor })
        .collect();

    let total: f64 = clean.iter().sum();
    let scale = bounds.area() / total;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| clean[b].total_cmp(&clean[a]).then(a.cmp(&b)));
    let areas: Vec<f64> = order.iter().map(|&i| clean[i] * scale).collect();

    let mut out = vec![empty; n];
    let mut rest = bounds;
    let mut start = 0;

    while start < n {
        let side = rest.width.min(rest.height);
        let mut end = start + 1;
        while end < n && worst_ratio(&areas[start..=end], side) <= worst_ratio(&areas[start..end], side) {
            end += 1;
        }
        let last_row = end == n;
        let row = &areas[start..end];
        let row_sum: f64 = row.iter().sum();

        if rest.width >= rest.height {
            // Column along the left edge, spanning the full (shorter) height.
            let thickness = if last_row { rest.width } else { row_sum / rest.height };
            let mut y = rest.y;
            for (k, &a) in row.iter().enumerate() {
                let h = if k + 1 == row.len() {
                    rest.y + rest.height - y
                } else {
                    a / thickness
                };
                out[order[start + k]] = Bounds {
                    x: rest.x,
                    y,
                    width: thickness,
                    height: h,
                };
                y += h;
            }
            rest.x += thickness;
            rest.width -= thickness;
        } else {
            let thickness = if last_row { rest.height } else { row_sum / rest.width };
            let mut x = rest.x;
            for (k, &a) in row.iter().enumerate() {
                let w = if k + 1 == row.len() {
                    rest.x + rest.width - x
                } else {
                    a / thickness
                };
                out[order[start + k]] = Bounds {
                    x,
                    y: rest.y,
                    width: w,
                    height: thickness,
                };
                x += w;
            }
            rest.y += thickness;
            rest.height -= thickness;
        }
        rest.width = rest.width.max(0.0);
        rest.height = rest.height.max(0.0);
        start = end;
    }
    out
}

// === TileLayoutEngine ===

pub trait TileLayoutTrait {
    fn layout(&self, mode: LayoutMode, tabs: &[TabRecord], container: Container, now_ms: i64) -> Layout;
    fn grid(&self, count: usize, container: Container) -> Layout;
    fn mosaic(&self, tabs: &[TabRecord], container: Container, now_ms: i64) -> Layout;
}

#[derive(Debug, Clone, Default)]
pub struct TileLayoutEngine {
    config: GridConfig,
}

impl TileLayoutEngine {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Height the mosaic fills: the container, or more when many tabs would
    /// otherwise get tiles shorter than a grid row.
    fn mosaic_height(&self, count: usize, container: Container) -> f64 {
        let columns = grid_columns(container.width, &self.config);
        let rows = count.div_ceil(columns);
        let row_height = self.config.tile_height * self.config.mosaic_density + self.config.gap;
        container.height.max(rows as f64 * row_height - self.config.gap)
    }
}

impl TileLayoutTrait for TileLayoutEngine {
    fn layout(&self, mode: LayoutMode, tabs: &[TabRecord], container: Container, now_ms: i64) -> Layout {
        match mode {
            LayoutMode::Grid => self.grid(tabs.len(), container),
            LayoutMode::Mosaic => self.mosaic(tabs, container, now_ms),
        }
    }

    fn grid(&self, count: usize, container: Container) -> Layout {
        let cfg = &self.config;
        let columns = grid_columns(container.width, cfg);
        let tile_width =
            ((container.width - cfg.gap * (columns as f64 - 1.0)) / columns as f64).max(0.0);

        let rects = (0..count)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                LayoutRect {
                    x: col as f64 * (tile_width + cfg.gap),
                    y: row as f64 * (cfg.tile_height + cfg.gap),
                    width: tile_width,
                    height: cfg.tile_height,
                    weight: BASE_WEIGHT,
                    rotation: 0.0,
                    z_index: 0,
                }
            })
            .collect();

        let rows = count.div_ceil(columns);
        let content_height = if rows == 0 {
            0.0
        } else {
            rows as f64 * cfg.tile_height + (rows - 1) as f64 * cfg.gap
        };

        Layout {
            mode: LayoutMode::Grid,
            rects,
            columns,
            content_height,
        }
    }

    fn mosaic(&self, tabs: &[TabRecord], container: Container, now_ms: i64) -> Layout {
        if tabs.is_empty() {
            return Layout {
                mode: LayoutMode::Mosaic,
                rects: Vec::new(),
                columns: grid_columns(container.width, &self.config),
                content_height: 0.0,
            };
        }

        let weights: Vec<f64> = tabs.iter().map(|t| tab_weight(t, now_ms)).collect();
        let bounds = Bounds {
            x: 0.0,
            y: 0.0,
            width: container.width.max(0.0),
            height: self.mosaic_height(tabs.len(), container),
        };
        let cells = squarify(&weights, bounds);

        // Heavier tiles stack above lighter ones.
        let mut rank: Vec<usize> = (0..tabs.len()).collect();
        rank.sort_by(|&a, &b| weights[a].total_cmp(&weights[b]).then(b.cmp(&a)));
        let mut z = vec![0i32; tabs.len()];
        for (level, &i) in rank.iter().enumerate() {
            z[i] = level as i32 + 1;
        }

        let rects: Vec<LayoutRect> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| LayoutRect {
                x: c.x,
                y: c.y,
                width: c.width,
                height: c.height,
                weight: weights[i],
                rotation: TILT[i % TILT.len()],
                z_index: z[i],
            })
            .collect();

        let top = rects.iter().map(|r| r.y).fold(f64::MAX, f64::min);
        let columns = rects.iter().filter(|r| (r.y - top).abs() < 0.5).count().max(1);

        Layout {
            mode: LayoutMode::Mosaic,
            rects,
            columns,
            content_height: bounds.height,
        }
    }
}
