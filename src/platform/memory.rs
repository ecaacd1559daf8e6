//! In-memory host used by the demo binary and the test-suite.
//!
//! Implements every capability trait over plain data guarded by a mutex, and
//! records what the core asked it to do so tests can assert on ordering,
//! call counts and peak concurrency.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::host::{KeyValueStore, ScriptHost, SurfaceChannel, TabSource, WindowHost};
use crate::types::errors::{HostError, SettingsError};
use crate::types::message::{SurfaceRequest, SurfaceResponse};
use crate::types::preview::DocumentSnapshot;
use crate::types::tab::{TabId, TabRecord, WindowId};
use crate::types::window::{DisplayWorkArea, WindowBounds};

/// Something the host was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    TabActivated(TabId),
    WindowFocused(WindowId),
    PopupCreated(WindowId, WindowBounds),
    BoundsUpdated(WindowId, WindowBounds),
    WindowRemoved(WindowId),
    SurfaceMessage(WindowId, SurfaceRequest),
}

struct HostState {
    tabs: Vec<TabRecord>,
    focused_window: Option<WindowId>,
    popups: BTreeMap<WindowId, WindowBounds>,
    next_window_id: WindowId,
    documents: HashMap<TabId, DocumentSnapshot>,
    work_area: Option<DisplayWorkArea>,
    fail_tab_query: bool,
    fail_create: bool,
    surface_unresponsive: bool,
    events: Vec<HostEvent>,
    snapshot_calls: usize,
    in_flight_snapshots: usize,
    peak_snapshots: usize,
    create_calls: usize,
}

/// Fake browser: tabs, windows, documents and a single display.
pub struct InMemoryHost {
    state: Mutex<HostState>,
    script_delay: Duration,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                tabs: Vec::new(),
                focused_window: None,
                popups: BTreeMap::new(),
                next_window_id: 1000,
                documents: HashMap::new(),
                work_area: Some(DisplayWorkArea {
                    left: 0,
                    top: 0,
                    width: 1920,
                    height: 1080,
                }),
                fail_tab_query: false,
                fail_create: false,
                surface_unresponsive: false,
                events: Vec::new(),
                snapshot_calls: 0,
                in_flight_snapshots: 0,
                peak_snapshots: 0,
                create_calls: 0,
            }),
            script_delay: Duration::ZERO,
        }
    }

    /// Every document snapshot takes `delay` to resolve.
    pub fn with_script_delay(mut self, delay: Duration) -> Self {
        self.script_delay = delay;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_tabs(&self, tabs: Vec<TabRecord>) {
        let mut s = self.lock();
        if s.focused_window.is_none() {
            s.focused_window = tabs.first().map(|t| t.window_id);
        }
        s.tabs = tabs;
    }

    pub fn set_focused_window(&self, window_id: Option<WindowId>) {
        self.lock().focused_window = window_id;
    }

    pub fn set_document(&self, tab_id: TabId, snapshot: DocumentSnapshot) {
        self.lock().documents.insert(tab_id, snapshot);
    }

    pub fn set_work_area(&self, area: Option<DisplayWorkArea>) {
        self.lock().work_area = area;
    }

    pub fn fail_tab_query(&self, fail: bool) {
        self.lock().fail_tab_query = fail;
    }

    pub fn fail_create(&self, fail: bool) {
        self.lock().fail_create = fail;
    }

    pub fn set_surface_unresponsive(&self, unresponsive: bool) {
        self.lock().surface_unresponsive = unresponsive;
    }

    /// Simulates the user closing a popup behind the controller's back.
    pub fn drop_popup(&self, window_id: WindowId) {
        self.lock().popups.remove(&window_id);
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.lock().events.clone()
    }

    pub fn popups(&self) -> Vec<(WindowId, WindowBounds)> {
        self.lock().popups.iter().map(|(id, b)| (*id, *b)).collect()
    }

    pub fn snapshot_calls(&self) -> usize {
        self.lock().snapshot_calls
    }

    pub fn peak_concurrent_snapshots(&self) -> usize {
        self.lock().peak_snapshots
    }

    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabSource for InMemoryHost {
    async fn query_tabs(&self) -> Result<Vec<TabRecord>, HostError> {
        let s = self.lock();
        if s.fail_tab_query {
            return Err(HostError::Unavailable("tabs.query".to_string()));
        }
        Ok(s.tabs.clone())
    }

    async fn last_focused_window(&self) -> Result<WindowId, HostError> {
        self.lock()
            .focused_window
            .ok_or_else(|| HostError::NotFound("no focused normal window".to_string()))
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut s = self.lock();
        if !s.tabs.iter().any(|t| t.id == tab_id) {
            return Err(HostError::NotFound(format!("tab {}", tab_id)));
        }
        s.events.push(HostEvent::TabActivated(tab_id));
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        let mut s = self.lock();
        s.focused_window = Some(window_id);
        s.events.push(HostEvent::WindowFocused(window_id));
        Ok(())
    }
}

#[async_trait]
impl WindowHost for InMemoryHost {
    async fn primary_work_area(&self) -> Result<DisplayWorkArea, HostError> {
        self.lock()
            .work_area
            .ok_or_else(|| HostError::Unavailable("system.display".to_string()))
    }

    async fn create_popup(&self, bounds: WindowBounds) -> Result<WindowId, HostError> {
        self.lock().create_calls += 1;
        // Window creation round-trips through the browser process.
        tokio::task::yield_now().await;
        let mut s = self.lock();
        if s.fail_create {
            return Err(HostError::Unavailable("windows.create".to_string()));
        }
        let id = s.next_window_id;
        s.next_window_id += 1;
        s.popups.insert(id, bounds);
        s.events.push(HostEvent::PopupCreated(id, bounds));
        Ok(id)
    }

    async fn update_bounds(
        &self,
        window_id: WindowId,
        bounds: WindowBounds,
    ) -> Result<(), HostError> {
        let mut s = self.lock();
        match s.popups.get_mut(&window_id) {
            Some(b) => {
                *b = bounds;
                s.events.push(HostEvent::BoundsUpdated(window_id, bounds));
                Ok(())
            }
            None => Err(HostError::NotFound(format!("window {}", window_id))),
        }
    }

    async fn focus(&self, window_id: WindowId) -> Result<(), HostError> {
        let mut s = self.lock();
        if !s.popups.contains_key(&window_id) && !s.tabs.iter().any(|t| t.window_id == window_id)
        {
            return Err(HostError::NotFound(format!("window {}", window_id)));
        }
        s.events.push(HostEvent::WindowFocused(window_id));
        Ok(())
    }

    async fn remove(&self, window_id: WindowId) -> Result<(), HostError> {
        let mut s = self.lock();
        if s.popups.remove(&window_id).is_none() {
            return Err(HostError::NotFound(format!("window {}", window_id)));
        }
        s.events.push(HostEvent::WindowRemoved(window_id));
        Ok(())
    }

    async fn list_windows(&self) -> Result<Vec<WindowId>, HostError> {
        let s = self.lock();
        let mut ids: BTreeSet<WindowId> = s.tabs.iter().map(|t| t.window_id).collect();
        ids.extend(s.popups.keys().copied());
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl ScriptHost for InMemoryHost {
    async fn snapshot_document(&self, tab_id: TabId) -> Result<DocumentSnapshot, HostError> {
        {
            let mut s = self.lock();
            s.snapshot_calls += 1;
            s.in_flight_snapshots += 1;
            s.peak_snapshots = s.peak_snapshots.max(s.in_flight_snapshots);
        }
        if self.script_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.script_delay).await;
        }
        let mut s = self.lock();
        s.in_flight_snapshots -= 1;
        s.documents
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| HostError::ExecutionFailed(format!("no document for tab {}", tab_id)))
    }
}

#[async_trait]
impl SurfaceChannel for InMemoryHost {
    async fn send(
        &self,
        window_id: WindowId,
        request: SurfaceRequest,
    ) -> Result<SurfaceResponse, HostError> {
        let mut s = self.lock();
        if s.surface_unresponsive || !s.popups.contains_key(&window_id) {
            return Err(HostError::Disconnected(format!("surface in window {}", window_id)));
        }
        s.events.push(HostEvent::SurfaceMessage(window_id, request));
        // The surface answers and closes its own window.
        s.popups.remove(&window_id);
        s.events.push(HostEvent::WindowRemoved(window_id));
        Ok(SurfaceResponse {
            ok: true,
            closing: true,
        })
    }
}

/// Key-value store kept in memory; survives as long as the value does.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    fail: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a storage error.
    pub fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn check(&self) -> Result<(), SettingsError> {
        if *self.fail.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(SettingsError::StorageError("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.check()?;
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.check()?;
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}
