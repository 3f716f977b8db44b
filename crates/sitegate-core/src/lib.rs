//! # SiteGate Core Library
//!
//! This library decides whether a list of sites should be blocked right now,
//! based on one daily time window, and keeps a rule-enforcement engine's
//! redirect rules in line with that decision.
//!
//! ## Architecture
//!
//! - **Window**: pure hour-based evaluation, including windows that wrap
//!   past midnight
//! - **Rules**: redirect rule construction inside a reserved id range
//! - **Storage**: key-value settings store and TOML application config
//! - **Engine**: atomic add/remove batches against the active rule set
//! - **Reconciler**: one idempotent diff-and-apply pass per trigger
//! - **Runtime**: interval, startup and settings-change triggers
//!
//! ## Key Components
//!
//! - [`Reconciler`]: the reconciliation pass
//! - [`SettingsStore`]: settings persistence and change notifications
//! - [`RuleEngine`]: rule enforcement backend
//! - [`Config`]: application configuration management

pub mod app;
pub mod engine;
pub mod error;
pub mod form;
pub mod reconciler;
pub mod rules;
pub mod runtime;
pub mod storage;
pub mod trigger;
pub mod window;

pub use app::App;
pub use engine::{FileRuleEngine, MemoryRuleEngine, RuleEngine, RuleUpdate};
pub use error::{ConfigError, CoreError, EngineError, SettingsError, ValidationError};
pub use form::SettingsForm;
pub use reconciler::{ReconcileReport, Reconciler, ReconcilerState};
pub use rules::{build_rules, IdRange, Rule, RuleTemplate};
pub use storage::{
    load_settings, Config, FileSettingsStore, MemorySettingsStore, Settings, SettingsStore,
};
pub use trigger::TriggerKind;
pub use window::{is_blocking, BlockWindow, Clock, FixedClock, SystemClock};
