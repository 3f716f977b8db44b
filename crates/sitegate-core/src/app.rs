//! Wiring of the file-backed collaborators inside one data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::FileRuleEngine;
use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::rules::block_page;
use crate::storage::{is_first_run, Config, FileSettingsStore};
use crate::window::Clock;

/// Everything SiteGate keeps in its data directory.
pub struct App {
    pub data_dir: PathBuf,
    pub config: Config,
    pub store: Arc<FileSettingsStore>,
    pub engine: Arc<FileRuleEngine>,
    /// No config existed before this open.
    pub first_run: bool,
}

impl App {
    /// Open `data_dir`, creating the config and block page on first use.
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let first_run = is_first_run(&data_dir);
        let config = Config::load_from(&data_dir)?;
        block_page::ensure(&data_dir)?;

        Ok(Self {
            store: Arc::new(FileSettingsStore::open(&data_dir)),
            engine: Arc::new(FileRuleEngine::open(&data_dir)),
            data_dir,
            config,
            first_run,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn redirect_url(&self) -> Result<String> {
        block_page::url(&self.config, &self.data_dir)
    }

    pub fn reconciler(&self, clock: Arc<dyn Clock>) -> Result<Reconciler> {
        Ok(Reconciler::new(
            self.store.clone(),
            self.engine.clone(),
            clock,
            &self.config.rules,
            self.redirect_url()?,
        ))
    }
}
