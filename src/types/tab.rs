use serde::{Deserialize, Serialize};

/// Host-assigned tab identifier, stable for the lifetime of a tab.
pub type TabId = i64;

/// Host-assigned window identifier.
pub type WindowId = i64;

/// Immutable snapshot of one open tab as reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: TabId,
    pub window_id: WindowId,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub discarded: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_accessed_at: i64,
}

impl TabRecord {
    /// Title shown on the tile, never empty.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Hostname of the tab URL, or the raw URL when it does not parse.
    pub fn hostname(&self) -> String {
        hostname_of(&self.url)
    }

    /// Favicon URL if it uses a scheme the surface may load directly.
    pub fn usable_favicon(&self) -> Option<&str> {
        let icon = self.favicon_url.as_deref()?;
        match url::Url::parse(icon) {
            Ok(u) if matches!(u.scheme(), "http" | "https" | "data") => Some(icon),
            _ => None,
        }
    }
}

pub fn hostname_of(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

/// True for URLs a preview script may be injected into.
pub fn is_capturable_url(raw: &str) -> bool {
    matches!(
        url::Url::parse(raw).as_ref().map(url::Url::scheme),
        Ok("http") | Ok("https")
    )
}

/// Which windows contribute tabs to the overview.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WindowScope {
    #[default]
    CurrentWindowOnly,
    AllWindows,
}

/// Filter configuration, rebuilt from UI state on every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    pub search_text: String,
    pub hide_discarded: bool,
    pub window_scope: WindowScope,
}

/// Ordered set of tabs the overview currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleSet {
    tabs: Vec<TabRecord>,
}

impl VisibleSet {
    pub fn new(tabs: Vec<TabRecord>) -> Self {
        Self { tabs }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TabRecord> {
        self.tabs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TabRecord> {
        self.tabs.iter()
    }

    pub fn as_slice(&self) -> &[TabRecord] {
        &self.tabs
    }

    pub fn position(&self, tab_id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    pub fn contains(&self, tab_id: TabId, url: &str) -> bool {
        self.tabs.iter().any(|t| t.id == tab_id && t.url == url)
    }
}
