pub mod difficulty;
pub mod export;
pub mod import;
pub mod init;
pub mod replay;
pub mod reset;
pub mod status;
pub mod take;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quizwall_core::store::{FileBackend, ProgressStore};
use quizwall_sources::config::load_config_from;
use quizwall_sources::QuizwallConfig;

/// Loaded configuration plus the progress store it points at.
pub struct Workspace {
    pub config: QuizwallConfig,
    pub store: ProgressStore,
}

impl Workspace {
    pub fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let backend = FileBackend::new(config.data_dir.clone());
        let store = ProgressStore::new(Arc::new(backend), config.identity());
        Ok(Self { config, store })
    }

    /// Fail unless `module_id` is one of the configured modules.
    pub fn require_module(&self, module_id: &str) -> Result<()> {
        if !self.config.is_known_module(module_id) {
            anyhow::bail!(
                "unknown module {module_id} (configured: {})",
                self.config.modules.join(", ")
            );
        }
        Ok(())
    }
}
