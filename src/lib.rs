//! TabMosaic: a visual overview of open browser tabs.
//!
//! This library crate exposes all modules for use by the binary and integration tests.
//! The core runs against the capability traits in [`platform::host`]; a host
//! browser integration implements them, the test-suite uses [`platform::memory`].

pub mod app;
pub mod database;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
