//! The `quizwall status` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizwall_core::statistics::{
    average_improvement, completion_rate, compute_totals, final_review_unlocked, format_duration,
};

use super::Workspace;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let progress = ws.store.load();
    let modules = &ws.config.modules;

    let mut table = Table::new();
    table.set_header(vec![
        "Module",
        "Status",
        "Attempts",
        "Best",
        "Time",
        "Last attempt",
    ]);

    for id in modules {
        let settings = ws.config.settings_for(id);
        let record = progress.module(id).cloned().unwrap_or_default();
        let status = if record.is_locked(&settings) {
            "Locked".to_string()
        } else {
            record.status().to_string()
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(status),
            Cell::new(format!("{}/{}", record.attempts, settings.attempt_limit)),
            Cell::new(
                record
                    .best_score_pct
                    .map(|b| format!("{b}%"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format_duration(record.total_time_sec)),
            Cell::new(
                record
                    .last_attempt_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    println!("Course: {}", progress.course);
    println!("{table}");

    let totals = compute_totals(&progress);
    println!();
    println!(
        "Completed: {}/{} modules ({}%)",
        totals.completed,
        modules.len(),
        completion_rate(&progress, modules)
    );
    println!("Attempts: {}", totals.attempts);
    println!("Average best score: {}%", totals.avg_best);
    println!(
        "Average improvement: {} points",
        average_improvement(&progress)
    );
    println!("Time spent: {}", format_duration(totals.total_time_sec));

    if final_review_unlocked(&progress, modules) {
        println!("\nFinal review unlocked: run `quizwall export --final`.");
    }

    Ok(())
}
