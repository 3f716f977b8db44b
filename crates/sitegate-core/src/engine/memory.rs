use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{apply_update, RuleEngine, RuleUpdate};
use crate::error::EngineError;
use crate::rules::Rule;

/// In-process engine.
#[derive(Default)]
pub struct MemoryRuleEngine {
    rules: Mutex<Vec<Rule>>,
}

impl MemoryRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine pre-loaded with rules, e.g. ones owned by another system.
    pub fn with_rules(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| r.id);
        Self {
            rules: Mutex::new(rules),
        }
    }
}

#[async_trait]
impl RuleEngine for MemoryRuleEngine {
    async fn update_rules(&self, update: RuleUpdate) -> Result<(), EngineError> {
        let mut rules = self.rules.lock().await;
        *rules = apply_update(&rules, &update)?;
        Ok(())
    }

    async fn rules(&self) -> Result<Vec<Rule>, EngineError> {
        Ok(self.rules.lock().await.clone())
    }
}
