//! The `quizwall reset` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Workspace;

pub fn execute(config_path: Option<PathBuf>, module: Option<String>, yes: bool) -> Result<()> {
    anyhow::ensure!(yes, "reset erases progress; pass --yes to confirm");

    let ws = Workspace::open(config_path)?;
    match module {
        Some(module_id) => {
            ws.require_module(&module_id)?;
            ws.store.reset_module(&module_id)?;
            println!("Reset progress for module {module_id}.");
        }
        None => {
            ws.store.reset_all()?;
            println!("Reset all progress for course {}.", ws.config.course);
        }
    }
    Ok(())
}
