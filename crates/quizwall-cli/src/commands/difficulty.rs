//! The `quizwall difficulty` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizwall_core::statistics::hardest;

use super::Workspace;

pub fn execute(config_path: Option<PathBuf>, min_exposures: u32, limit: usize) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let items = hardest(&ws.store.load(), min_exposures, limit);

    if items.is_empty() {
        println!("No questions seen at least {min_exposures} time(s) yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Question", "Correct %", "Correct", "Seen"]);
    for item in &items {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(format!("{}%", item.pct)),
            Cell::new(item.correct),
            Cell::new(item.seen),
        ]);
    }
    println!("{table}");

    Ok(())
}
