//! Tab Registry for the overview.
//!
//! Holds the last full tab snapshot and derives the ordered visible set from it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::platform::host::TabSource;
use crate::types::tab::{FilterCriteria, TabRecord, VisibleSet, WindowId, WindowScope};

/// Trait defining the registry interface.
#[async_trait]
pub trait TabRegistryTrait: Send {
    /// Replaces the snapshot from the host and returns the filtered set. Never fails.
    async fn refresh(&mut self, criteria: &FilterCriteria) -> VisibleSet;
    /// Pure function of the last snapshot and `criteria`.
    fn apply_filters(&self, criteria: &FilterCriteria) -> VisibleSet;
    fn all_tabs(&self) -> &[TabRecord];
    fn current_window(&self) -> Option<WindowId>;
}

/// Registry backed by a host [`TabSource`].
pub struct TabRegistry {
    source: Arc<dyn TabSource>,
    tabs: Vec<TabRecord>,
    current_window: Option<WindowId>,
}

impl TabRegistry {
    pub fn new(source: Arc<dyn TabSource>) -> Self {
        Self {
            source,
            tabs: Vec::new(),
            current_window: None,
        }
    }
}

#[async_trait]
impl TabRegistryTrait for TabRegistry {
    async fn refresh(&mut self, criteria: &FilterCriteria) -> VisibleSet {
        self.tabs = match self.source.query_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, "tab enumeration failed, showing no tabs");
                Vec::new()
            }
        };

        // Scope filtering degrades to all windows when this lookup fails.
        self.current_window = match self.source.last_focused_window().await {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "current window unknown");
                None
            }
        };

        debug!(
            tabs = self.tabs.len(),
            current_window = ?self.current_window,
            "tab snapshot refreshed"
        );
        self.apply_filters(criteria)
    }

    fn apply_filters(&self, criteria: &FilterCriteria) -> VisibleSet {
        filter_tabs(&self.tabs, self.current_window, criteria)
    }

    fn all_tabs(&self) -> &[TabRecord] {
        &self.tabs
    }

    fn current_window(&self) -> Option<WindowId> {
        self.current_window
    }
}

/// Scope, then discard state, then case-insensitive substring match on title or
/// URL; the survivors are stably sorted most-recently-accessed first.
pub fn filter_tabs(
    tabs: &[TabRecord],
    current_window: Option<WindowId>,
    criteria: &FilterCriteria,
) -> VisibleSet {
    let query = criteria.search_text.trim().to_lowercase();
    let scope_window = match criteria.window_scope {
        WindowScope::CurrentWindowOnly => current_window,
        WindowScope::AllWindows => None,
    };

    let mut visible: Vec<TabRecord> = tabs
        .iter()
        .filter(|t| scope_window.map_or(true, |w| t.window_id == w))
        .filter(|t| !(criteria.hide_discarded && t.discarded))
        .filter(|t| {
            query.is_empty()
                || t.title.to_lowercase().contains(&query)
                || t.url.to_lowercase().contains(&query)
        })
        .cloned()
        .collect();

    visible.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
    VisibleSet::new(visible)
}
