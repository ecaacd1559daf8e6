use serde::{Deserialize, Serialize};

use super::tab::WindowId;

/// Window position and size in screen pixels, as persisted under `overviewBounds`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowBounds {
    pub width: i32,
    pub height: i32,
    pub top: i32,
    pub left: i32,
}

/// Usable area of the primary display (excludes docks, task bars).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayWorkArea {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Lifecycle state of the single overview window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverviewWindowState {
    #[default]
    Absent,
    Creating,
    Open { window_id: WindowId },
}

impl OverviewWindowState {
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            OverviewWindowState::Open { window_id } => Some(*window_id),
            _ => None,
        }
    }
}
