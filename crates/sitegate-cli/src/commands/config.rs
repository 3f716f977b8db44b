use std::path::Path;

use clap::Subcommand;
use sitegate_core::{App, Config};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "daemon.interval_secs", "rules.base_offset")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(app: App, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => match app.config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            let mut config = app.config;
            config.set(&key, &value)?;
            config.save_to(&app.data_dir)?;
            println!("ok");
        }
        ConfigAction::List => {
            let json = serde_json::to_string_pretty(&app.config)?;
            println!("{json}");
        }
        ConfigAction::Reset => reset(&app.data_dir)?,
    }
    Ok(())
}

/// Runs before the data directory is opened, so an unreadable config can
/// still be replaced.
pub fn reset(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;
    Config::reset(data_dir)?;
    println!("config reset to defaults");
    Ok(())
}
