use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{apply_update, RuleEngine, RuleUpdate};
use crate::error::EngineError;
use crate::rules::Rule;

/// Engine backed by a JSON rule list at `<data_dir>/rules.json`.
///
/// The file is what an external enforcer (proxy, browser policy bridge)
/// consumes. Every update rewrites it through a temp file and rename, so
/// readers never observe a half-applied batch.
pub struct FileRuleEngine {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRuleEngine {
    pub fn open(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join("rules.json"))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> EngineError {
        EngineError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read(&self) -> Result<Vec<Rule>, EngineError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            EngineError::QueryFailed(format!("{} is not a rule list: {e}", self.path.display()))
        })
    }

    async fn write(&self, rules: &[Rule]) -> Result<(), EngineError> {
        let content = serde_json::to_string_pretty(rules)
            .map_err(|e| EngineError::UpdateRejected(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[async_trait]
impl RuleEngine for FileRuleEngine {
    async fn update_rules(&self, update: RuleUpdate) -> Result<(), EngineError> {
        let _guard = self.lock.lock().await;
        let current = self.read().await?;
        let next = apply_update(&current, &update)?;
        if next != current {
            self.write(&next).await?;
        }
        Ok(())
    }

    async fn rules(&self) -> Result<Vec<Rule>, EngineError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }
}
