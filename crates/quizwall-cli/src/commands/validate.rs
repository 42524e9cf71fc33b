//! The `quizwall validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizwall_core::parser::{module_id_from_file_name, parse_pool, validate_pool};

pub fn execute(pool_path: PathBuf) -> Result<()> {
    let files = if pool_path.is_dir() {
        pool_files(&pool_path)?
    } else {
        vec![pool_path]
    };

    if files.is_empty() {
        anyhow::bail!("no module-<id>-pool.json files found");
    }

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for file in &files {
        let pool = match parse_pool(file) {
            Ok(pool) => pool,
            Err(e) => {
                println!("{}: ERROR: {e:#}", file.display());
                total_errors += 1;
                continue;
            }
        };

        println!("Pool: {} ({} questions)", pool.title, pool.len());

        let warnings = validate_pool(&pool);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_errors > 0 {
        anyhow::bail!("{total_errors} pool(s) failed to load");
    }

    if total_warnings == 0 {
        println!("All pools valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn pool_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(module_id_from_file_name)
                .is_some()
        })
        .collect();
    files.sort();
    Ok(files)
}
