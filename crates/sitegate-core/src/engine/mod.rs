//! Rule-enforcement engines.
//!
//! An engine holds the active redirect rules of every owner. Updates are
//! atomic batches: removals are applied before additions, and a batch that
//! fails validation leaves the engine untouched.

mod file;
mod memory;

pub use file::FileRuleEngine;
pub use memory::MemoryRuleEngine;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::rules::Rule;

/// One atomic update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub add_rules: Vec<Rule>,
    pub remove_rule_ids: Vec<u32>,
}

#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Apply a batch atomically.
    async fn update_rules(&self, update: RuleUpdate) -> Result<(), EngineError>;

    /// All rules currently held, sorted by id.
    async fn rules(&self) -> Result<Vec<Rule>, EngineError>;

    /// Ids of all rules currently held.
    async fn rule_ids(&self) -> Result<Vec<u32>, EngineError> {
        Ok(self.rules().await?.into_iter().map(|r| r.id).collect())
    }
}

/// Apply `update` to `current`, returning the new rule list.
///
/// Shared by the bundled engines so they reject the same batches.
pub(crate) fn apply_update(current: &[Rule], update: &RuleUpdate) -> Result<Vec<Rule>, EngineError> {
    let removed: HashSet<u32> = update.remove_rule_ids.iter().copied().collect();
    let mut next: Vec<Rule> = current
        .iter()
        .filter(|r| !removed.contains(&r.id))
        .cloned()
        .collect();

    let mut held: HashSet<u32> = next.iter().map(|r| r.id).collect();
    for rule in &update.add_rules {
        let filter = rule.url_filter();
        if filter.is_empty() {
            return Err(EngineError::UpdateRejected(format!(
                "rule {} has an empty url filter",
                rule.id
            )));
        }
        if !filter.is_ascii() {
            return Err(EngineError::UpdateRejected(format!(
                "rule {} url filter '{}' is not ASCII",
                rule.id, filter
            )));
        }
        if !held.insert(rule.id) {
            return Err(EngineError::UpdateRejected(format!(
                "rule id {} is already in use",
                rule.id
            )));
        }
        next.push(rule.clone());
    }

    next.sort_by_key(|r| r.id);
    Ok(next)
}
