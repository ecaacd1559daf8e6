use tabmosaic::types::errors::*;

// === HostError Tests ===

#[test]
fn host_error_display_variants() {
    assert_eq!(
        HostError::Unavailable("system.display".to_string()).to_string(),
        "Host capability unavailable: system.display"
    );
    assert_eq!(
        HostError::NotFound("window 7".to_string()).to_string(),
        "Host object not found: window 7"
    );
    assert_eq!(
        HostError::PermissionDenied("tabs".to_string()).to_string(),
        "Host permission denied: tabs"
    );
    assert_eq!(
        HostError::ExecutionFailed("renderer crashed".to_string()).to_string(),
        "Script execution failed: renderer crashed"
    );
    assert_eq!(
        HostError::Disconnected("surface".to_string()).to_string(),
        "Message channel disconnected: surface"
    );
}

#[test]
fn host_error_is_comparable_and_cloneable() {
    let err = HostError::NotFound("tab 1".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, HostError::NotFound("tab 2".to_string()));
}

#[test]
fn host_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(HostError::Unavailable("x".to_string()));
    assert!(err.source().is_none());
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::StorageError("disk full".to_string()).to_string(),
        "Settings storage error: disk full"
    );
    assert_eq!(
        SettingsError::SerializationError("bad json".to_string()).to_string(),
        "Settings serialization error: bad json"
    );
    assert_eq!(
        SettingsError::InvalidKey("foo".to_string()).to_string(),
        "Invalid settings key: foo"
    );
    assert_eq!(
        SettingsError::InvalidValue("expected bool".to_string()).to_string(),
        "Invalid settings value: expected bool"
    );
}

#[test]
fn settings_error_from_rusqlite() {
    let err: SettingsError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, SettingsError::StorageError(_)));
}

// === FetchError Tests ===

#[test]
fn fetch_error_display_variants() {
    assert_eq!(
        FetchError::Network("timeout".to_string()).to_string(),
        "Image fetch failed: timeout"
    );
    assert_eq!(FetchError::Status(404).to_string(), "Image fetch returned status 404");
    assert_eq!(
        FetchError::TooLarge(3_000_000).to_string(),
        "Image too large to inline: 3000000 bytes"
    );
    assert_eq!(
        FetchError::NotAnImage("text/html".to_string()).to_string(),
        "Response is not an image: text/html"
    );
}

// === MessageError Tests ===

#[test]
fn message_error_display_variants() {
    assert_eq!(
        MessageError::UnknownMessage("explode".to_string()).to_string(),
        "Unknown message type: explode"
    );
    assert_eq!(
        MessageError::MissingField("id".to_string()).to_string(),
        "Missing message field: id"
    );
    assert_eq!(
        MessageError::InvalidField("type".to_string()).to_string(),
        "Invalid message field: type"
    );
}
