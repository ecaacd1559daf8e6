//! Message dispatch between the lifecycle controller and the overview surface.
//!
//! Messages travel as small JSON envelopes: `{"id": "<uuid>", "type": "<kind>"}`.
//! Replies echo the id. Decoding is strict about the envelope and the message
//! kind; anything else is reported as a [`MessageError`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::app::OverviewSurface;
use crate::managers::window_lifecycle::WindowLifecycleTrait;
use crate::types::errors::MessageError;
use crate::types::message::{ControllerRequest, SurfaceRequest, SurfaceResponse};

/// Sent by the global activation trigger (icon click, keyboard shortcut).
pub const TOGGLE_MESSAGE: &str = "toggle-overview";

/// Fresh request id for an outgoing envelope.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn kind_of<T: Serialize>(request: &T) -> Result<String, MessageError> {
    match serde_json::to_value(request) {
        Ok(Value::String(kind)) => Ok(kind),
        _ => Err(MessageError::InvalidField("type".to_string())),
    }
}

/// Wraps a request in an envelope with a new id.
pub fn encode_request<T: Serialize>(request: &T) -> Result<Value, MessageError> {
    Ok(json!({ "id": new_request_id(), "type": kind_of(request)? }))
}

/// Splits an envelope into its id and message kind.
pub fn parse_envelope(message: &Value) -> Result<(String, String), MessageError> {
    let object = message
        .as_object()
        .ok_or_else(|| MessageError::InvalidField("envelope".to_string()))?;
    let id = match object.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(_) => return Err(MessageError::InvalidField("id".to_string())),
        None => return Err(MessageError::MissingField("id".to_string())),
    };
    let kind = match object.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) => return Err(MessageError::InvalidField("type".to_string())),
        None => return Err(MessageError::MissingField("type".to_string())),
    };
    Ok((id, kind))
}

fn decode_kind<T: DeserializeOwned>(kind: &str) -> Result<T, MessageError> {
    serde_json::from_value(Value::String(kind.to_string()))
        .map_err(|_| MessageError::UnknownMessage(kind.to_string()))
}

pub fn decode_controller_request(message: &Value) -> Result<(String, ControllerRequest), MessageError> {
    let (id, kind) = parse_envelope(message)?;
    Ok((id, decode_kind(&kind)?))
}

pub fn decode_surface_request(message: &Value) -> Result<(String, SurfaceRequest), MessageError> {
    let (id, kind) = parse_envelope(message)?;
    Ok((id, decode_kind(&kind)?))
}

/// Reads a surface reply. Missing flags read as `false`.
pub fn decode_surface_response(reply: &Value) -> Result<SurfaceResponse, MessageError> {
    let object = reply
        .as_object()
        .ok_or_else(|| MessageError::InvalidField("reply".to_string()))?;
    let flag = |name: &str| match object.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(MessageError::InvalidField(name.to_string())),
    };
    Ok(SurfaceResponse {
        ok: flag("ok")?,
        closing: flag("closing")?,
    })
}

/// Controller side: handles toggle and surface-originated requests.
pub async fn handle_controller_message(
    controller: &dyn WindowLifecycleTrait,
    message: &Value,
) -> Result<Value, MessageError> {
    let (id, kind) = parse_envelope(message)?;
    debug!(%id, %kind, "controller message");

    if kind == TOGGLE_MESSAGE {
        controller.toggle().await;
    } else {
        match decode_kind::<ControllerRequest>(&kind)? {
            ControllerRequest::CloseOverviewWindow => controller.close_overview_window().await,
            ControllerRequest::ResetWindowBounds => controller.reset_window_bounds().await,
        }
    }
    Ok(json!({ "id": id, "ok": true }))
}

/// Surface side: answers handle-shortcut requests.
pub fn handle_surface_message(
    surface: &mut OverviewSurface,
    message: &Value,
) -> Result<Value, MessageError> {
    let (id, request) = decode_surface_request(message)?;
    let response = surface.handle_request(request);
    Ok(json!({ "id": id, "ok": response.ok, "closing": response.closing }))
}
