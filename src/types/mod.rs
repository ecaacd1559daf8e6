// Tab overview shared type definitions
// Each submodule defines types used across the application.

pub mod errors;
pub mod layout;
pub mod message;
pub mod preview;
pub mod settings;
pub mod tab;
pub mod window;
