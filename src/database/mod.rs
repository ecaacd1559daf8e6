//! Settings database layer.
//!
//! SQLite connection management, schema migrations, and the key-value store
//! the settings engine and the lifecycle controller persist through.
//!
//! # Usage
//!
//! ```no_run
//! use tabmosaic::database::SqliteStore;
//!
//! let store = SqliteStore::open("tabmosaic.db").expect("failed to open settings store");
//! let store = SqliteStore::open_in_memory().expect("failed to open in-memory store");
//! ```

pub mod connection;
pub mod migrations;
pub mod store;

pub use connection::Database;
pub use store::SqliteStore;
