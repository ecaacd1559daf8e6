use std::fmt;

// === HostError ===

/// Errors returned by capability calls into the host browser.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// The capability is not available right now (API missing, display info unavailable).
    Unavailable(String),
    /// The referenced tab or window does not exist (anymore).
    NotFound(String),
    /// The host refused the operation.
    PermissionDenied(String),
    /// Running code inside a tab's document failed (navigated away, crashed renderer).
    ExecutionFailed(String),
    /// The other end of a message channel is gone.
    Disconnected(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Unavailable(msg) => write!(f, "Host capability unavailable: {}", msg),
            HostError::NotFound(what) => write!(f, "Host object not found: {}", what),
            HostError::PermissionDenied(msg) => write!(f, "Host permission denied: {}", msg),
            HostError::ExecutionFailed(msg) => write!(f, "Script execution failed: {}", msg),
            HostError::Disconnected(msg) => write!(f, "Message channel disconnected: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

// === SettingsError ===

/// Errors related to settings and key-value storage.
#[derive(Debug)]
pub enum SettingsError {
    /// The backing store failed to read or write.
    StorageError(String),
    /// Failed to serialize or deserialize a stored value.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided value does not fit the settings schema.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::StorageError(msg) => write!(f, "Settings storage error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<rusqlite::Error> for SettingsError {
    fn from(e: rusqlite::Error) -> Self {
        SettingsError::StorageError(e.to_string())
    }
}

// === FetchError ===

/// Errors raised while downloading a preview image for inlining.
#[derive(Debug)]
pub enum FetchError {
    /// The request could not be completed.
    Network(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The body exceeded the inline size limit.
    TooLarge(usize),
    /// The server answered with something other than an image.
    NotAnImage(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Image fetch failed: {}", msg),
            FetchError::Status(code) => write!(f, "Image fetch returned status {}", code),
            FetchError::TooLarge(size) => write!(f, "Image too large to inline: {} bytes", size),
            FetchError::NotAnImage(ct) => write!(f, "Response is not an image: {}", ct),
        }
    }
}

impl std::error::Error for FetchError {}

// === MessageError ===

/// Errors related to controller/surface message dispatch.
#[derive(Debug, PartialEq)]
pub enum MessageError {
    /// The message type is not known to the receiver.
    UnknownMessage(String),
    /// A required field is missing from the message.
    MissingField(String),
    /// A field has the wrong type or an out-of-range value.
    InvalidField(String),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::UnknownMessage(kind) => write!(f, "Unknown message type: {}", kind),
            MessageError::MissingField(field) => write!(f, "Missing message field: {}", field),
            MessageError::InvalidField(field) => write!(f, "Invalid message field: {}", field),
        }
    }
}

impl std::error::Error for MessageError {}
