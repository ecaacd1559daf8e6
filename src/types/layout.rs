use serde::{Deserialize, Serialize};

/// Placement of one tile for the current render pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    /// Degrees; non-zero only in mosaic mode.
    pub rotation: f64,
    pub z_index: i32,
}

impl LayoutRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Overlap area with another rect (0 when they only touch).
    pub fn intersection_area(&self, other: &LayoutRect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Grid,
    Mosaic,
}

/// Size of the scrollable tile container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    pub width: f64,
    pub height: f64,
}

/// Currently scrolled-to region of the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

/// Result of one layout pass, indexed like the visible set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub mode: LayoutMode,
    pub rects: Vec<LayoutRect>,
    pub columns: usize,
    pub content_height: f64,
}
