//! Visibility-driven capture trigger.
//!
//! Tiles are observed after every layout pass. A tile fires once, the first
//! time it intersects the viewport extended by a lookahead margin below the
//! fold, and is then no longer observed.

use std::collections::BTreeSet;

use crate::types::layout::{LayoutRect, Viewport};

#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    margin: f64,
    rects: Vec<LayoutRect>,
    observed: BTreeSet<usize>,
    connected: bool,
}

impl VisibilityTracker {
    pub fn new(lookahead_margin: f64) -> Self {
        Self {
            margin: lookahead_margin.max(0.0),
            rects: Vec::new(),
            observed: BTreeSet::new(),
            connected: false,
        }
    }

    /// Starts observing every tile of a fresh layout pass.
    pub fn observe(&mut self, rects: &[LayoutRect]) {
        self.rects = rects.to_vec();
        self.observed = (0..rects.len()).collect();
        self.connected = true;
    }

    /// Stops observing; later viewport updates fire nothing.
    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn pending(&self) -> usize {
        self.observed.len()
    }

    /// Indices that entered the extended viewport, in reading order.
    pub fn update(&mut self, viewport: Viewport) -> Vec<usize> {
        if !self.connected {
            return Vec::new();
        }
        let top = viewport.scroll_top;
        let bottom = viewport.scroll_top + viewport.height + self.margin;
        let fired: Vec<usize> = self
            .observed
            .iter()
            .copied()
            .filter(|&i| {
                let r = &self.rects[i];
                r.y < bottom && r.bottom() > top
            })
            .collect();
        for i in &fired {
            self.observed.remove(i);
        }
        fired
    }
}
