//! The settings form.
//!
//! A plain read/write view of the store with text fields. It has no blocking
//! logic of its own: it splits and parses what the user typed and writes the
//! three keys back verbatim. Range checks happen in the reconciler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SettingsError;
use crate::storage::settings::{
    SettingsMap, SettingsStore, DEFAULT_END_HOUR, DEFAULT_START_HOUR, KEY_BLOCKED_SITES,
    KEY_END_HOUR, KEY_START_HOUR, SETTINGS_KEYS,
};

/// Text fields as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsForm {
    pub blocked_sites: String,
    pub start_hour: String,
    pub end_hour: String,
}

impl SettingsForm {
    /// Fill the fields from raw store values. Absent or mistyped hours show
    /// the defaults; an absent site list stays blank.
    pub fn from_stored(map: &SettingsMap) -> Self {
        let blocked_sites = match map.get(KEY_BLOCKED_SITES) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        let hour = |key: &str, default: i64| match map.get(key) {
            Some(Value::Number(n)) => n.to_string(),
            _ => default.to_string(),
        };

        Self {
            blocked_sites,
            start_hour: hour(KEY_START_HOUR, DEFAULT_START_HOUR),
            end_hour: hour(KEY_END_HOUR, DEFAULT_END_HOUR),
        }
    }

    /// Read the store into a form.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, SettingsError> {
        Ok(Self::from_stored(&store.get(&SETTINGS_KEYS).await?))
    }

    /// Comma-separated list, trimmed, blanks dropped.
    pub fn parsed_sites(&self) -> Vec<String> {
        self.blocked_sites
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Store values for the current field contents.
    pub fn to_values(&self) -> SettingsMap {
        let mut values = SettingsMap::new();
        values.insert(KEY_BLOCKED_SITES.into(), Value::from(self.parsed_sites()));
        values.insert(KEY_START_HOUR.into(), Value::from(parse_hour(&self.start_hour)));
        values.insert(KEY_END_HOUR.into(), Value::from(parse_hour(&self.end_hour)));
        values
    }

    /// Write all three keys in one store call.
    pub async fn submit(&self, store: &dyn SettingsStore) -> Result<SettingsMap, SettingsError> {
        let values = self.to_values();
        store.set(values.clone()).await?;
        Ok(values)
    }
}

/// Leading optional sign and decimal digits; anything unparsable is 0.
/// Digit runs too long for `i64` saturate, so they stay out of range.
pub fn parse_hour(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    }
}
