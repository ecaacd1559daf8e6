//! Selection & navigation over the visible tile set.
//!
//! The cursor is either "none" or an index into the visible set. Keyboard and
//! mouse events move it; Enter and Escape produce side effects that the
//! overview executes in order.

use crate::types::tab::{TabId, VisibleSet, WindowId};

/// Keys the overview reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
}

impl NavKey {
    /// Maps a DOM `KeyboardEvent.key` name.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(NavKey::Left),
            "ArrowRight" => Some(NavKey::Right),
            "ArrowUp" => Some(NavKey::Up),
            "ArrowDown" => Some(NavKey::Down),
            "Enter" => Some(NavKey::Enter),
            "Escape" => Some(NavKey::Escape),
            _ => None,
        }
    }
}

/// Side effects requested by navigation. Order is significant: activation
/// always precedes teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    ActivateTab { tab_id: TabId, window_id: WindowId },
    CloseOverview,
}

/// Cursor state machine. Invariant: `cursor < len` whenever it is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    cursor: Option<usize>,
    len: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor as a signed index, `-1` meaning "none".
    pub fn cursor_value(&self) -> isize {
        self.cursor.map_or(-1, |i| i as isize)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clamps the cursor after the visible set changed size.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            other => other,
        };
    }

    /// Mouse entered tile `index`. Out-of-range indices are ignored.
    pub fn hover(&mut self, index: usize) -> bool {
        if index >= self.len || self.cursor == Some(index) {
            return false;
        }
        self.cursor = Some(index);
        true
    }

    /// Mouse left the grid.
    pub fn mouse_leave(&mut self) {
        self.cursor = None;
    }

    /// Arrow movement; `columns` comes from the rendered layout at call time.
    /// From "none" any arrow selects the first tile. Movement clamps at the ends.
    pub fn move_cursor(&mut self, key: NavKey, columns: usize) -> bool {
        if self.len == 0 {
            return false;
        }
        let last = self.len - 1;
        let columns = columns.max(1);
        let next = match (self.cursor, key) {
            (None, NavKey::Left | NavKey::Right | NavKey::Up | NavKey::Down) => 0,
            (Some(i), NavKey::Left) => i.saturating_sub(1),
            (Some(i), NavKey::Right) => (i + 1).min(last),
            (Some(i), NavKey::Up) => i.saturating_sub(columns),
            (Some(i), NavKey::Down) => (i + columns).min(last),
            (_, NavKey::Enter | NavKey::Escape) => return false,
        };
        let changed = self.cursor != Some(next);
        self.cursor = Some(next);
        changed
    }

    /// Full key handling. Returns the effects to execute, in order.
    pub fn handle_key(
        &mut self,
        key: NavKey,
        columns: usize,
        visible: &VisibleSet,
    ) -> Vec<SelectionEffect> {
        match key {
            NavKey::Escape => vec![SelectionEffect::CloseOverview],
            NavKey::Enter => self
                .cursor
                .and_then(|i| visible.get(i))
                .map(|tab| activation_effects(tab.id, tab.window_id))
                .unwrap_or_default(),
            arrow => {
                self.move_cursor(arrow, columns);
                Vec::new()
            }
        }
    }
}

/// Effects for activating a tab: focus it first, tear the overview down second.
pub fn activation_effects(tab_id: TabId, window_id: WindowId) -> Vec<SelectionEffect> {
    vec![
        SelectionEffect::ActivateTab { tab_id, window_id },
        SelectionEffect::CloseOverview,
    ]
}
