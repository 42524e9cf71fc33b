//! Dashboard aggregates over a progress store.
//!
//! Everything here is a pure function of a [`Progress`] snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::progress::{ItemStat, Progress};
use crate::scoring::{percent, rounded_mean};

/// Default `min_exposures` for [`item_difficulty`].
pub const DEFAULT_MIN_EXPOSURES: u32 = 2;

/// Default number of rows in [`hardest`].
pub const DEFAULT_HARDEST_LIMIT: usize = 8;

/// Course-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Attempts across all modules.
    pub attempts: u32,
    /// Modules marked completed.
    pub completed: u32,
    /// Rounded mean best score over modules that have one.
    pub avg_best: u32,
    /// Seconds spent across all modules.
    pub total_time_sec: u64,
}

/// Compute [`Totals`] for `progress`.
pub fn compute_totals(progress: &Progress) -> Totals {
    let modules = progress.modules.values();

    let bests: Vec<u32> = modules.clone().filter_map(|m| m.best_score_pct).collect();

    Totals {
        attempts: modules.clone().map(|m| m.attempts).sum(),
        completed: modules.clone().filter(|m| m.completed).count() as u32,
        avg_best: rounded_mean(&bests),
        total_time_sec: modules.map(|m| m.total_time_sec).sum(),
    }
}

/// Observed difficulty of one question, merged across modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDifficulty {
    pub id: String,
    /// Rounded percentage of exposures answered correctly.
    pub pct: u32,
    pub seen: u32,
    pub correct: u32,
}

/// Per-question correctness, hardest first.
///
/// Item stats are merged by question id across modules; items seen fewer than
/// `min_exposures` times are dropped. Ordering is ascending `pct`, then
/// descending `seen`, then ascending id.
pub fn item_difficulty(progress: &Progress, min_exposures: u32) -> Vec<ItemDifficulty> {
    let mut merged: BTreeMap<&str, ItemStat> = BTreeMap::new();
    for (id, stat) in progress.modules.values().flat_map(|m| &m.item_stats) {
        let entry = merged.entry(id.as_str()).or_default();
        entry.seen += stat.seen;
        entry.correct += stat.correct;
    }

    let mut items: Vec<ItemDifficulty> = merged
        .into_iter()
        .filter(|(_, stat)| stat.seen >= min_exposures && stat.seen > 0)
        .map(|(id, stat)| ItemDifficulty {
            id: id.to_string(),
            pct: percent(u64::from(stat.correct), u64::from(stat.seen)),
            seen: stat.seen,
            correct: stat.correct,
        })
        .collect();

    items.sort_by(|a, b| {
        a.pct
            .cmp(&b.pct)
            .then_with(|| b.seen.cmp(&a.seen))
            .then_with(|| a.id.cmp(&b.id))
    });
    items
}

/// The first `limit` entries of [`item_difficulty`].
pub fn hardest(progress: &Progress, min_exposures: u32, limit: usize) -> Vec<ItemDifficulty> {
    let mut items = item_difficulty(progress, min_exposures);
    items.truncate(limit);
    items
}

/// Rounded mean of `max(0, best - first)` over modules with history.
pub fn average_improvement(progress: &Progress) -> u32 {
    let gains: Vec<u32> = progress
        .modules
        .values()
        .filter_map(|m| {
            let first = m.first_score_pct()?;
            let best = m.best_score_pct.unwrap_or(first);
            Some(best.saturating_sub(first))
        })
        .collect();
    rounded_mean(&gains)
}

/// Percentage of the configured modules that are completed.
pub fn completion_rate(progress: &Progress, module_ids: &[String]) -> u32 {
    let completed = module_ids
        .iter()
        .filter(|id| progress.module(id).is_some_and(|m| m.completed))
        .count();
    percent(completed as u64, module_ids.len() as u64)
}

/// Whether every configured module is completed.
pub fn final_review_unlocked(progress: &Progress, module_ids: &[String]) -> bool {
    !module_ids.is_empty()
        && module_ids
            .iter()
            .all(|id| progress.module(id).is_some_and(|m| m.completed))
}

/// `1h 5m`, `3m 7s`, or `42s`.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
