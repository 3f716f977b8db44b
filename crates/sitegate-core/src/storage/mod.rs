mod config;
pub mod settings;

pub use config::{Config, DaemonConfig, LogConfig, RulesConfig};
pub use settings::{
    load_settings, FileSettingsStore, MemorySettingsStore, Settings, SettingsChange, SettingsStore,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the SiteGate data directory, creating it if needed.
///
/// `SITEGATE_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/sitegate[-dev]/`, with SITEGATE_ENV=dev selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SITEGATE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SITEGATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("sitegate-dev")
            } else {
                base_dir.join("sitegate")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// True until the first config file has been written to `dir`.
pub fn is_first_run(dir: &std::path::Path) -> bool {
    !Config::path_in(dir).exists()
}
