//! The `quizwall replay` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizwall_core::report::replay_attempt;
use quizwall_core::statistics::format_duration;
use quizwall_core::traits::PoolSource;
use quizwall_sources::create_pool_source;

use super::Workspace;

pub async fn execute(
    config_path: Option<PathBuf>,
    module_id: String,
    attempt: usize,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    ws.require_module(&module_id)?;

    let progress = ws.store.load();
    let record = progress
        .module(&module_id)
        .and_then(|m| m.history.get(attempt.checked_sub(1)?))
        .with_context(|| format!("module {module_id} has no attempt {attempt}"))?;

    let source = create_pool_source(&ws.config.pool)?;
    let pool = source.fetch_pool(&module_id).await?;
    let replay = replay_attempt(&pool, &ws.config.settings_for(&module_id), record);

    println!(
        "Module {module_id}, attempt {attempt}: {}% ({}/{}) in {}, seed {}{}",
        record.score_pct,
        record.correct,
        record.total,
        format_duration(record.elapsed_sec),
        record.seed,
        if record.auto_submit {
            ", auto-submitted"
        } else {
            ""
        }
    );
    if !replay.matches_record {
        println!("Note: the pool has changed since this attempt; questions may differ.");
    }
    println!();

    for (n, (question, feedback)) in replay.questions.iter().zip(&replay.feedback).enumerate() {
        println!("{}. {}", n + 1, question.prompt);
        for i in 0..question.choices.len() {
            let Some(line) = question.labeled_choice(i) else {
                continue;
            };
            let marker = if i == question.answer_index {
                " <- answer"
            } else if feedback.chosen_index == Some(i) {
                " <- chosen"
            } else {
                ""
            };
            println!("   {line}{marker}");
        }
        println!("   {}", feedback.explanation);
        println!();
    }

    Ok(())
}
