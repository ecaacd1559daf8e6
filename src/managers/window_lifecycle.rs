//! Window Lifecycle Controller.
//!
//! Owns the single overview window. The state machine itself is the pure
//! [`transition`] function; [`OverviewController`] holds the current state,
//! performs the effects a transition asks for against the host, and feeds the
//! outcome of each effect back in as the next event.
//!
//! The state is updated under a lock before the first host call of any
//! toggle, so a second toggle arriving while the first is still creating the
//! window observes `Creating` and does nothing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::platform::host::{ControllerLink, KeyValueStore, SurfaceChannel, WindowHost};
use crate::services::debounce::{Debouncer, Writer};
use crate::services::settings_engine::{
    clear_bounds, clear_window_id, read_bounds, read_window_id, write_bounds, write_window_id,
};
use crate::types::errors::HostError;
use crate::types::message::{ControllerRequest, SurfaceRequest};
use crate::types::settings::{GeometryConfig, OverviewConfig};
use crate::types::tab::WindowId;
use crate::types::window::{DisplayWorkArea, OverviewWindowState, WindowBounds};

// === State machine ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Icon click or keyboard shortcut.
    Toggle,
    /// A persisted window id still names a live window.
    Recovered { window_id: WindowId },
    /// No live window to take over. `stale` is set when an id was persisted.
    NothingToRecover { stale: bool },
    Created { window_id: WindowId },
    CreateFailed,
    SurfaceAcknowledged,
    SurfaceUnresponsive,
    WindowRemoved { window_id: WindowId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    CheckPersistedWindow,
    CreateSurface,
    PersistWindowId(WindowId),
    /// Raise a freshly created popup above the browser window that spawned it.
    FocusWindow(WindowId),
    ClearWindowId,
    SendSurfaceRequest {
        window_id: WindowId,
        request: SurfaceRequest,
    },
    ForceRemove(WindowId),
    /// Final geometry write for the window that just went away.
    PersistGeometry,
}

/// `(state, event) -> (state, effects)`. Events that do not apply to the
/// current state leave it unchanged and produce no effects.
pub fn transition(
    state: OverviewWindowState,
    event: LifecycleEvent,
) -> (OverviewWindowState, Vec<LifecycleEffect>) {
    use LifecycleEffect as Fx;
    use LifecycleEvent as Ev;
    use OverviewWindowState as St;

    match (state, event) {
        (St::Absent, Ev::Toggle) => (St::Creating, vec![Fx::CheckPersistedWindow]),
        (St::Creating, Ev::Toggle) => (St::Creating, Vec::new()),

        (St::Creating, Ev::Recovered { window_id }) => (
            St::Open { window_id },
            vec![Fx::SendSurfaceRequest {
                window_id,
                request: SurfaceRequest::HandleShortcut,
            }],
        ),
        (St::Creating, Ev::NothingToRecover { stale }) => {
            let mut effects = Vec::with_capacity(2);
            if stale {
                effects.push(Fx::ClearWindowId);
            }
            effects.push(Fx::CreateSurface);
            (St::Creating, effects)
        }
        (St::Creating, Ev::Created { window_id }) => {
            (
                St::Open { window_id },
                vec![Fx::PersistWindowId(window_id), Fx::FocusWindow(window_id)],
            )
        }
        (St::Creating, Ev::CreateFailed) => (St::Absent, Vec::new()),

        (St::Open { window_id }, Ev::Toggle) => (
            state,
            vec![Fx::SendSurfaceRequest {
                window_id,
                request: SurfaceRequest::HandleShortcut,
            }],
        ),
        (St::Open { .. }, Ev::SurfaceAcknowledged) => {
            (St::Absent, vec![Fx::PersistGeometry, Fx::ClearWindowId])
        }
        (St::Open { window_id }, Ev::SurfaceUnresponsive) => (
            St::Absent,
            vec![
                Fx::ForceRemove(window_id),
                Fx::PersistGeometry,
                Fx::ClearWindowId,
            ],
        ),
        (St::Open { window_id }, Ev::WindowRemoved { window_id: removed })
            if removed == window_id =>
        {
            (St::Absent, vec![Fx::PersistGeometry, Fx::ClearWindowId])
        }

        (state, _) => (state, Vec::new()),
    }
}

// === Geometry ===

/// Default placement: a fraction of the work area, capped, centered.
pub fn default_bounds(area: DisplayWorkArea, config: &GeometryConfig) -> WindowBounds {
    let width = ((area.width as f64 * config.width_fraction).round() as i32)
        .min(config.max_width)
        .max(1);
    let height = ((area.height as f64 * config.height_fraction).round() as i32)
        .min(config.max_height)
        .max(1);
    WindowBounds {
        width,
        height,
        left: area.left + (area.width - width) / 2,
        top: area.top + (area.height - height) / 2,
    }
}

/// Fits persisted bounds inside the work area, keeping them at least the
/// configured minimum size where the display allows.
pub fn clamp_to_work_area(
    bounds: WindowBounds,
    area: DisplayWorkArea,
    config: &GeometryConfig,
) -> WindowBounds {
    let width = bounds
        .width
        .clamp(config.min_width.min(area.width), area.width.max(1));
    let height = bounds
        .height
        .clamp(config.min_height.min(area.height), area.height.max(1));
    WindowBounds {
        width,
        height,
        left: bounds
            .left
            .clamp(area.left, area.left + (area.width - width).max(0)),
        top: bounds
            .top
            .clamp(area.top, area.top + (area.height - height).max(0)),
    }
}

/// Bounds for a new window. `area` is `None` when the display could not be queried.
pub fn compute_initial_bounds(
    persisted: Option<WindowBounds>,
    area: Option<DisplayWorkArea>,
    config: &GeometryConfig,
) -> WindowBounds {
    match (persisted, area) {
        (Some(bounds), Some(area)) => clamp_to_work_area(bounds, area, config),
        (None, Some(area)) => default_bounds(area, config),
        (Some(bounds), None) => bounds,
        (None, None) => config.fallback,
    }
}

// === OverviewController ===

/// Trait defining the lifecycle controller interface.
#[async_trait]
pub trait WindowLifecycleTrait: Send + Sync {
    fn state(&self) -> OverviewWindowState;
    /// Global activation entry point.
    async fn toggle(&self);
    /// Host notification: a window was removed by any means.
    async fn on_window_removed(&self, window_id: WindowId);
    /// Host notification: a window moved or was resized.
    fn on_bounds_changed(&self, window_id: WindowId, bounds: WindowBounds);
    /// Forgets stored geometry and moves an open window to the default placement.
    async fn reset_window_bounds(&self);
    /// Removes the open window, if any.
    async fn close_overview_window(&self);
}

pub struct OverviewController {
    windows: Arc<dyn WindowHost>,
    surface: Arc<dyn SurfaceChannel>,
    store: Arc<dyn KeyValueStore>,
    geometry_config: GeometryConfig,
    state: Mutex<OverviewWindowState>,
    geometry: Debouncer<WindowBounds>,
}

impl OverviewController {
    pub fn new(
        windows: Arc<dyn WindowHost>,
        surface: Arc<dyn SurfaceChannel>,
        store: Arc<dyn KeyValueStore>,
        config: &OverviewConfig,
    ) -> Self {
        let sink = store.clone();
        let writer: Writer<WindowBounds> = Arc::new(move |bounds| {
            let sink = sink.clone();
            Box::pin(async move {
                if let Err(e) = write_bounds(sink.as_ref(), bounds).await {
                    warn!(error = %e, "failed to persist window bounds");
                }
            })
        });

        Self {
            windows,
            surface,
            store,
            geometry_config: config.geometry.clone(),
            state: Mutex::new(OverviewWindowState::Absent),
            geometry: Debouncer::new(config.geometry_debounce, writer),
        }
    }

    fn apply(&self, event: LifecycleEvent) -> Vec<LifecycleEffect> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let previous = *state;
        let (next, effects) = transition(previous, event);
        if next != previous {
            info!(from = ?previous, to = ?next, ?event, "overview window state changed");
        }
        *state = next;
        effects
    }

    /// Runs `event` and every event its effects produce, in order.
    async fn dispatch(&self, event: LifecycleEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.apply(event) {
                if let Some(next) = self.execute(effect).await {
                    queue.push_back(next);
                }
            }
        }
    }

    async fn execute(&self, effect: LifecycleEffect) -> Option<LifecycleEvent> {
        match effect {
            LifecycleEffect::CheckPersistedWindow => Some(self.check_persisted_window().await),
            LifecycleEffect::CreateSurface => {
                let bounds = self.initial_bounds().await;
                match self.windows.create_popup(bounds).await {
                    Ok(window_id) => Some(LifecycleEvent::Created { window_id }),
                    Err(e) => {
                        warn!(error = %e, "overview window creation failed");
                        Some(LifecycleEvent::CreateFailed)
                    }
                }
            }
            LifecycleEffect::PersistWindowId(window_id) => {
                if let Err(e) = write_window_id(self.store.as_ref(), window_id).await {
                    warn!(error = %e, "failed to persist overview window id");
                }
                None
            }
            LifecycleEffect::FocusWindow(window_id) => {
                if let Err(e) = self.windows.focus(window_id).await {
                    debug!(window_id, error = %e, "could not focus overview window");
                }
                None
            }
            LifecycleEffect::ClearWindowId => {
                if let Err(e) = clear_window_id(self.store.as_ref()).await {
                    warn!(error = %e, "failed to clear overview window id");
                }
                None
            }
            LifecycleEffect::SendSurfaceRequest { window_id, request } => {
                match self.surface.send(window_id, request).await {
                    Ok(response) if response.ok => Some(LifecycleEvent::SurfaceAcknowledged),
                    Ok(_) => {
                        warn!(window_id, "overview surface refused request, forcing removal");
                        Some(LifecycleEvent::SurfaceUnresponsive)
                    }
                    Err(e) => {
                        warn!(window_id, error = %e, "overview surface unreachable, forcing removal");
                        Some(LifecycleEvent::SurfaceUnresponsive)
                    }
                }
            }
            LifecycleEffect::ForceRemove(window_id) => {
                if let Err(e) = self.windows.remove(window_id).await {
                    debug!(window_id, error = %e, "forced removal found no window");
                }
                None
            }
            LifecycleEffect::PersistGeometry => {
                self.geometry.flush().await;
                None
            }
        }
    }

    async fn check_persisted_window(&self) -> LifecycleEvent {
        let persisted = match read_window_id(self.store.as_ref()).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "could not read persisted window id");
                None
            }
        };
        let Some(window_id) = persisted else {
            return LifecycleEvent::NothingToRecover { stale: false };
        };

        match self.windows.list_windows().await {
            Ok(ids) if ids.contains(&window_id) => {
                info!(window_id, "recovered overview window after restart");
                LifecycleEvent::Recovered { window_id }
            }
            Ok(_) => {
                debug!(window_id, "clearing stale overview window id");
                LifecycleEvent::NothingToRecover { stale: true }
            }
            Err(e) => {
                warn!(error = %e, "window listing failed, treating stored id as stale");
                LifecycleEvent::NothingToRecover { stale: true }
            }
        }
    }

    async fn work_area(&self) -> Option<DisplayWorkArea> {
        match self.windows.primary_work_area().await {
            Ok(area) => Some(area),
            Err(e) => {
                warn!(error = %e, "display info unavailable, using fallback geometry");
                None
            }
        }
    }

    async fn initial_bounds(&self) -> WindowBounds {
        let persisted = match read_bounds(self.store.as_ref()).await {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!(error = %e, "could not read persisted bounds");
                None
            }
        };
        compute_initial_bounds(persisted, self.work_area().await, &self.geometry_config)
    }
}

#[async_trait]
impl WindowLifecycleTrait for OverviewController {
    fn state(&self) -> OverviewWindowState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn toggle(&self) {
        self.dispatch(LifecycleEvent::Toggle).await;
    }

    async fn on_window_removed(&self, window_id: WindowId) {
        self.dispatch(LifecycleEvent::WindowRemoved { window_id }).await;
    }

    fn on_bounds_changed(&self, window_id: WindowId, bounds: WindowBounds) {
        if self.state().window_id() == Some(window_id) {
            self.geometry.schedule(bounds);
        }
    }

    async fn reset_window_bounds(&self) {
        self.geometry.cancel();
        if let Err(e) = clear_bounds(self.store.as_ref()).await {
            warn!(error = %e, "failed to clear stored bounds");
        }
        let Some(window_id) = self.state().window_id() else {
            return;
        };
        let bounds = match self.work_area().await {
            Some(area) => default_bounds(area, &self.geometry_config),
            None => self.geometry_config.fallback,
        };
        if let Err(e) = self.windows.update_bounds(window_id, bounds).await {
            warn!(window_id, error = %e, "failed to move overview window");
        }
    }

    async fn close_overview_window(&self) {
        let Some(window_id) = self.state().window_id() else {
            return;
        };
        if let Err(e) = self.windows.remove(window_id).await {
            debug!(window_id, error = %e, "overview window already gone");
        }
        self.dispatch(LifecycleEvent::WindowRemoved { window_id }).await;
    }
}

#[async_trait]
impl ControllerLink for OverviewController {
    async fn send(&self, request: ControllerRequest) -> Result<(), HostError> {
        debug!(?request, "controller request");
        match request {
            ControllerRequest::CloseOverviewWindow => self.close_overview_window().await,
            ControllerRequest::ResetWindowBounds => self.reset_window_bounds().await,
        }
        Ok(())
    }
}
