//! Events that start a reconciliation.
//!
//! Triggers carry no state; every kind is handled by the same
//! [`Reconciler::reconcile`](crate::Reconciler::reconcile) entry point.

use serde::{Deserialize, Serialize};

/// Why a reconciliation was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TriggerKind {
    /// First run against a fresh data directory
    #[serde(rename = "Installed")]
    Installed,

    /// Daemon restarted against an existing data directory
    #[serde(rename = "Startup")]
    Startup,

    /// Periodic interval tick
    #[serde(rename = "Alarm")]
    Alarm,

    /// The settings store was written
    #[serde(rename = "SettingsChanged")]
    SettingsChanged,

    /// Explicit request, e.g. `sitegate reconcile`
    #[serde(rename = "Manual")]
    Manual,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Installed => "installed",
            TriggerKind::Startup => "startup",
            TriggerKind::Alarm => "alarm",
            TriggerKind::SettingsChanged => "settings-changed",
            TriggerKind::Manual => "manual",
        }
    }

    /// Trigger for the first pass of a daemon run.
    pub fn initial(first_run: bool) -> Self {
        if first_run {
            TriggerKind::Installed
        } else {
            TriggerKind::Startup
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_serialize() {
        let json = serde_json::to_string(&TriggerKind::SettingsChanged).unwrap();
        assert_eq!(json, r#"{"type":"SettingsChanged"}"#);
    }

    #[test]
    fn test_trigger_deserialize() {
        let trigger: TriggerKind = serde_json::from_str(r#"{"type":"Alarm"}"#).unwrap();
        assert_eq!(trigger, TriggerKind::Alarm);
    }

    #[test]
    fn test_initial_trigger() {
        assert_eq!(TriggerKind::initial(true), TriggerKind::Installed);
        assert_eq!(TriggerKind::initial(false), TriggerKind::Startup);
        assert_eq!(TriggerKind::Startup.to_string(), "startup");
    }
}
