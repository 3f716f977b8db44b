//! Reconciliation of the block window against the rule engine.
//!
//! One pass loads the settings, evaluates the window at the current hour and
//! sends a single self-describing update to the engine:
//!
//! - **Blocking**: remove every id of the owned range (plus any stale ids left
//!   in the reserved range by a longer list) and add the freshly built rules.
//! - **Not blocking**: remove every rule id the engine currently reports.
//!
//! Passes are not serialized against each other. Two overlapping passes each
//! send a complete update, so the engine ends in the state of whichever
//! update it applied last.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::engine::{RuleEngine, RuleUpdate};
use crate::error::Result;
use crate::rules::{build_rules, IdRange, RuleTemplate};
use crate::storage::{load_settings, RulesConfig, SettingsStore};
use crate::trigger::TriggerKind;
use crate::window::{is_blocking, Clock};

/// Whether any pass is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilerState {
    Idle,
    Reconciling,
}

/// Outcome of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub trigger: TriggerKind,
    pub hour: u8,
    pub should_block: bool,
    /// Ids owned by the settings this pass read.
    pub owned: IdRange,
    pub added: Vec<u32>,
    pub removed: Vec<u32>,
}

/// Drives one or more concurrent reconciliation passes.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn SettingsStore>,
    engine: Arc<dyn RuleEngine>,
    clock: Arc<dyn Clock>,
    reserved: IdRange,
    template: RuleTemplate,
    in_flight: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        engine: Arc<dyn RuleEngine>,
        clock: Arc<dyn Clock>,
        rules: &RulesConfig,
        redirect_url: String,
    ) -> Self {
        Self {
            store,
            engine,
            clock,
            reserved: rules.reserved_range(),
            template: rules.template(redirect_url),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<dyn RuleEngine> {
        &self.engine
    }

    pub fn reserved_range(&self) -> &IdRange {
        &self.reserved
    }

    pub fn state(&self) -> ReconcilerState {
        if self.in_flight() > 0 {
            ReconcilerState::Reconciling
        } else {
            ReconcilerState::Idle
        }
    }

    /// Number of passes currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run one pass. Failures are logged here and returned; nothing is retried.
    pub async fn reconcile(&self, trigger: TriggerKind) -> Result<ReconcileReport> {
        let _in_flight = InFlight::enter(&self.in_flight);
        debug!(%trigger, "Reconciling");

        match self.run(trigger).await {
            Ok(report) => {
                if report.should_block {
                    info!(
                        %trigger,
                        hour = report.hour,
                        owned = %report.owned,
                        added = report.added.len(),
                        removed = report.removed.len(),
                        "Blocking rules applied"
                    );
                } else {
                    info!(
                        %trigger,
                        hour = report.hour,
                        removed = report.removed.len(),
                        "Blocking rules removed, sites are accessible"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                error!(%trigger, error = %e, "Reconciliation failed");
                Err(e)
            }
        }
    }

    async fn run(&self, trigger: TriggerKind) -> Result<ReconcileReport> {
        let settings = load_settings(self.store.as_ref()).await?;
        let window = settings.window()?;
        let hour = self.clock.current_hour();
        let should_block = is_blocking(window.start_hour(), window.end_hour(), hour)?;

        let owned = IdRange::owned_within(&self.reserved, settings.blocked_sites.len())?;
        let held = self.engine.rule_ids().await?;

        let update = if should_block {
            let mut remove_rule_ids = owned.ids();
            remove_rule_ids.extend(
                held.iter()
                    .copied()
                    .filter(|id| self.reserved.contains(*id) && !owned.contains(*id)),
            );
            RuleUpdate {
                add_rules: build_rules(&settings.blocked_sites, &self.template),
                remove_rule_ids,
            }
        } else {
            RuleUpdate {
                add_rules: Vec::new(),
                remove_rule_ids: held,
            }
        };

        let added = update.add_rules.iter().map(|r| r.id).collect();
        let removed = update.remove_rule_ids.clone();
        self.engine.update_rules(update).await?;

        Ok(ReconcileReport {
            trigger,
            hour,
            should_block,
            owned,
            added,
            removed,
        })
    }
}
