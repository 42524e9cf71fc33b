//! The `quizwall export` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizwall_core::report::final_review;
use quizwall_core::store::{final_export_filename, module_export_filename, progress_export_filename};

use super::Workspace;

pub fn execute(
    config_path: Option<PathBuf>,
    module: Option<String>,
    final_export: bool,
    output: PathBuf,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let course = &ws.config.course;

    let (file_name, json) = if final_export {
        let progress = ws.store.load();
        let review = final_review(&progress, &ws.config.modules).with_context(|| {
            format!(
                "final review is locked until all {} modules are completed",
                ws.config.modules.len()
            )
        })?;
        let json =
            serde_json::to_string_pretty(&review).context("failed to serialize final review")?;
        (final_export_filename(course), json)
    } else if let Some(module_id) = module {
        ws.require_module(&module_id)?;
        (
            module_export_filename(course, &module_id),
            ws.store.export_module(&module_id)?,
        )
    } else {
        (progress_export_filename(course), ws.store.export_snapshot()?)
    };

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let path = output.join(file_name);
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write export to {}", path.display()))?;

    println!("Exported {}", path.display());
    Ok(())
}
