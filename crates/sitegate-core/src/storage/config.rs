//! TOML-based application configuration.
//!
//! Stores operational settings that are not part of the user's block list:
//! - Daemon timing (reconcile interval, settings file polling)
//! - Rule ownership (owner tag, reserved id range, priority, redirect target)
//! - Log filter
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::rules::{IdRange, RuleTemplate};

/// Trigger timing for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_settings_poll_secs")]
    pub settings_poll_secs: u64,
}

/// Rule id ownership and rule shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_base_offset")]
    pub base_offset: u32,
    #[serde(default = "default_reserved_capacity")]
    pub reserved_capacity: u32,
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Empty means the bundled block page in the data directory.
    #[serde(default)]
    pub redirect_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// Default functions
fn default_interval_secs() -> u64 {
    60
}
fn default_settings_poll_secs() -> u64 {
    2
}
fn default_owner() -> String {
    "sitegate".into()
}
fn default_base_offset() -> u32 {
    1000
}
fn default_reserved_capacity() -> u32 {
    1000
}
fn default_priority() -> u32 {
    1
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            settings_poll_secs: default_settings_poll_secs(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            base_offset: default_base_offset(),
            reserved_capacity: default_reserved_capacity(),
            priority: default_priority(),
            redirect_url: String::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl RulesConfig {
    /// The full id range this owner may ever touch.
    pub fn reserved_range(&self) -> IdRange {
        IdRange::new(self.owner.clone(), self.base_offset, self.reserved_capacity)
    }

    /// Reject a reserved range whose last id would pass `u32::MAX`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reserved_range()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "rules.base_offset".to_string(),
                message: e.to_string(),
            })
    }

    pub fn template(&self, redirect_url: String) -> RuleTemplate {
        RuleTemplate {
            base_offset: self.base_offset,
            priority: self.priority,
            redirect_url,
        }
    }
}

impl DaemonConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn settings_poll(&self) -> Duration {
        Duration::from_secs(self.settings_poll_secs.max(1))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of the config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// Load from `dir`, writing defaults if no config exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// holds an invalid reserved range, or if the default config cannot be
    /// written to disk.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                })?;
                cfg.rules.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(dir)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Overwrite the config in `dir` with defaults without reading it first.
    pub fn reset(dir: &Path) -> Result<Self, ConfigError> {
        let cfg = Self::default();
        cfg.save_to(dir)?;
        Ok(cfg)
    }

    /// Persist to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, dir: &Path) -> Result<(), ConfigError> {
        let path = Self::path_in(dir);
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not match the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.rules.validate()?;
        *self = updated;
        Ok(())
    }
}
