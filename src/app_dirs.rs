//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate locations:
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/duewatch/` | `~/.config/duewatch/` |
//! | Data / logs | `~/Library/Application Support/duewatch/` | `~/.local/share/duewatch/` |
//!
//! Overrides for tests and custom deployments:
//! - `DUEWATCH_CONFIG_DIR` overrides [`config_dir`]
//! - `DUEWATCH_DATA_DIR` overrides [`data_dir`]

use std::path::PathBuf;

/// Application config directory. Holds `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("DUEWATCH_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("duewatch"))
        .unwrap_or_else(|| PathBuf::from("/tmp/duewatch-config"))
}

/// Application data root directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("DUEWATCH_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("duewatch"))
        .unwrap_or_else(|| PathBuf::from("/tmp/duewatch-data"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Default config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
