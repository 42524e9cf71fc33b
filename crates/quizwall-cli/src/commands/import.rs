//! The `quizwall import` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use quizwall_core::store::ImportOutcome;

use super::Workspace;

pub fn execute(config_path: Option<PathBuf>, file: PathBuf, yes: bool) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let course = ws.config.course.clone();
    let outcome = ws.store.import_snapshot(&text, |foreign| {
        yes || confirm(&format!(
            "This snapshot belongs to course {foreign}, not {course}. Import anyway? [y/N] "
        ))
    })?;

    match outcome {
        ImportOutcome::Imported { modules } => {
            println!(
                "Imported progress for {modules} module(s) from {}",
                file.display()
            );
        }
        ImportOutcome::Declined { course } => {
            println!("Import of course {course} declined; progress unchanged.");
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes")
}
