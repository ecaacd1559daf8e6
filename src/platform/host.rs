//! Capabilities consumed from the host browser.
//!
//! Every call may suspend; none may block the thread. Implementations wrap the
//! browser's tab, window, scripting, storage and messaging APIs. The core only
//! ever talks to these traits so it can run against [`super::memory`] fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::errors::{HostError, SettingsError};
use crate::types::message::{ControllerRequest, SurfaceRequest, SurfaceResponse};
use crate::types::preview::DocumentSnapshot;
use crate::types::tab::{TabId, TabRecord, WindowId};
use crate::types::window::{DisplayWorkArea, WindowBounds};

/// Tab enumeration and activation.
#[async_trait]
pub trait TabSource: Send + Sync {
    /// Lists every open tab across all windows.
    async fn query_tabs(&self) -> Result<Vec<TabRecord>, HostError>;

    /// The most recently focused window of type "normal".
    async fn last_focused_window(&self) -> Result<WindowId, HostError>;

    /// Makes the tab active inside its window.
    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Brings a window to the front.
    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError>;
}

/// Top-level popup window management.
#[async_trait]
pub trait WindowHost: Send + Sync {
    async fn primary_work_area(&self) -> Result<DisplayWorkArea, HostError>;

    async fn create_popup(&self, bounds: WindowBounds) -> Result<WindowId, HostError>;

    async fn update_bounds(&self, window_id: WindowId, bounds: WindowBounds)
        -> Result<(), HostError>;

    async fn focus(&self, window_id: WindowId) -> Result<(), HostError>;

    async fn remove(&self, window_id: WindowId) -> Result<(), HostError>;

    /// Ids of every window that currently exists.
    async fn list_windows(&self) -> Result<Vec<WindowId>, HostError>;
}

/// Runs the preview probe inside a tab's main world and returns what it collected.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    async fn snapshot_document(&self, tab_id: TabId) -> Result<DocumentSnapshot, HostError>;
}

/// Small persistent key-value storage. Missing keys read as `None`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    async fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

/// Controller → surface channel.
#[async_trait]
pub trait SurfaceChannel: Send + Sync {
    async fn send(
        &self,
        window_id: WindowId,
        request: SurfaceRequest,
    ) -> Result<SurfaceResponse, HostError>;
}

/// Surface → controller channel.
#[async_trait]
pub trait ControllerLink: Send + Sync {
    async fn send(&self, request: ControllerRequest) -> Result<(), HostError>;
}
