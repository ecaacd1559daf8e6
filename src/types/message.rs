use serde::{Deserialize, Serialize};

/// Requests the lifecycle controller sends into the open overview surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceRequest {
    /// The global toggle fired while the surface is open.
    HandleShortcut,
}

/// Surface reply to a [`SurfaceRequest`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurfaceResponse {
    pub ok: bool,
    /// The surface has started tearing itself down.
    pub closing: bool,
}

/// Requests the overview surface sends to the lifecycle controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerRequest {
    CloseOverviewWindow,
    ResetWindowBounds,
}
