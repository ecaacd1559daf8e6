// Tab overview platform layer
// Host capability traits, an in-memory host, and the on-disk location of the settings store.

use std::env;
use std::path::PathBuf;

pub mod host;
pub mod memory;

const APP_DIR: &str = "tabmosaic";

/// Returns the directory holding the settings database.
///
/// - **Linux**: `$XDG_CONFIG_HOME/tabmosaic`, else `~/.config/tabmosaic`
/// - **macOS**: `~/Library/Application Support/TabMosaic`
/// - **Windows**: `%APPDATA%/TabMosaic`
///
/// `TABMOSAIC_CONFIG_DIR` overrides all of the above.
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var("TABMOSAIC_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join("TabMosaic")
    }
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA")
            .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
        PathBuf::from(appdata).join("TabMosaic")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) => PathBuf::from(xdg).join(APP_DIR),
            Err(_) => home_dir().join(".config").join(APP_DIR),
        }
    }
}

/// Path of the SQLite settings store inside [`get_config_dir`].
pub fn settings_db_path() -> PathBuf {
    get_config_dir().join(format!("{}.db", APP_DIR))
}

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}
