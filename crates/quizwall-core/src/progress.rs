//! The persisted progress record.
//!
//! One [`Progress`] document exists per learner per course. It is plain data:
//! every persisted mutation goes through [`crate::store::ProgressStore`],
//! which keeps `updated_at` and the module invariants consistent.
//!
//! Field names serialize in camelCase so exports stay interchangeable with
//! stores written by the browser version of the quiz wall.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::scoring::is_mastered;
use crate::settings::ModuleSettings;

/// Version written into freshly created stores.
pub const ENGINE_VERSION: &str = "1.0.0";

fn engine_version() -> String {
    ENGINE_VERSION.to_string()
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root progress document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default = "engine_version")]
    pub version: String,
    #[serde(default)]
    pub course: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modules: BTreeMap<String, ModuleRecord>,
}

/// Cumulative progress for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub best_score_pct: Option<u32>,
    #[serde(default)]
    pub total_time_sec: u64,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<AttemptRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_stats: BTreeMap<String, ItemStat>,
}

/// One submitted attempt. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub at: DateTime<Utc>,
    pub seed: u32,
    #[serde(default)]
    pub auto_submit: bool,
    pub score_pct: u32,
    pub correct: u32,
    pub total: u32,
    pub elapsed_sec: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub per_question: Vec<QuestionOutcome>,
}

/// How the learner did on one question of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub id: String,
    #[serde(default)]
    pub chosen_index: Option<usize>,
    pub correct_index: usize,
    #[serde(alias = "isCorrect")]
    pub ok: bool,
}

/// Exposure counts for one question across a module's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStat {
    #[serde(default)]
    pub seen: u32,
    #[serde(default)]
    pub correct: u32,
}

/// Coarse module state used by dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::NotStarted => write!(f, "Not started"),
            ModuleStatus::InProgress => write!(f, "In progress"),
            ModuleStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl Progress {
    /// A fresh, empty store.
    pub fn new(course: &str, version: &str, now: DateTime<Utc>) -> Self {
        Self {
            version: version.to_string(),
            course: course.to_string(),
            created_at: now,
            updated_at: now,
            modules: BTreeMap::new(),
        }
    }

    pub fn module(&self, module_id: &str) -> Option<&ModuleRecord> {
        self.modules.get(module_id)
    }

    /// The module's record, created empty on first access.
    pub fn module_mut(&mut self, module_id: &str) -> &mut ModuleRecord {
        self.modules.entry(module_id.to_string()).or_default()
    }

    pub fn module_status(&self, module_id: &str) -> ModuleStatus {
        self.module(module_id)
            .map(ModuleRecord::status)
            .unwrap_or(ModuleStatus::NotStarted)
    }

    /// Mark the store as modified at `now`, keeping `updated_at >= created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Append an attempt to a module and update every derived field.
    pub fn record_attempt(&mut self, module_id: &str, record: AttemptRecord, mastery_pct: u8) {
        let at = record.at;
        self.module_mut(module_id).apply(record, mastery_pct);
        self.touch(at);
    }

    /// Bring a loaded or imported document back in line with the record
    /// invariants.
    ///
    /// Derived module fields are rebuilt from `history`; `completed` is left
    /// as stored. A `created_at` later than `updated_at` is pulled back to it.
    /// Returns whether anything changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;
        if self.created_at > self.updated_at {
            self.created_at = self.updated_at;
            changed = true;
        }
        for module in self.modules.values_mut() {
            changed |= module.rebuild_derived();
        }
        changed
    }

    /// Check every module against the record invariants.
    pub fn audit(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        if self.updated_at < self.created_at {
            violations.push(InvariantViolation {
                module_id: None,
                message: "updatedAt is earlier than createdAt".into(),
            });
        }
        for (id, module) in &self.modules {
            for message in module.violations() {
                violations.push(InvariantViolation {
                    module_id: Some(id.clone()),
                    message,
                });
            }
        }
        violations
    }
}

impl ModuleRecord {
    pub fn status(&self) -> ModuleStatus {
        if self.completed {
            ModuleStatus::Completed
        } else if self.attempts == 0 {
            ModuleStatus::NotStarted
        } else {
            ModuleStatus::InProgress
        }
    }

    /// Whether a new attempt must be refused under `settings`.
    pub fn is_locked(&self, settings: &ModuleSettings) -> bool {
        self.attempts >= settings.attempt_limit && !self.completed
    }

    /// Attempts left before the module locks; `None` once it is completed.
    pub fn attempts_remaining(&self, settings: &ModuleSettings) -> Option<u32> {
        if self.completed {
            None
        } else {
            Some(settings.attempt_limit.saturating_sub(self.attempts))
        }
    }

    /// Score of the first recorded attempt.
    pub fn first_score_pct(&self) -> Option<u32> {
        self.history.first().map(|h| h.score_pct)
    }

    fn apply(&mut self, record: AttemptRecord, mastery_pct: u8) {
        for outcome in &record.per_question {
            let stat = self.item_stats.entry(outcome.id.clone()).or_default();
            stat.seen += 1;
            if outcome.ok {
                stat.correct += 1;
            }
        }

        self.attempts += 1;
        self.total_time_sec += record.elapsed_sec;
        self.last_attempt_at = Some(record.at);
        self.best_score_pct = Some(
            self.best_score_pct
                .map_or(record.score_pct, |best| best.max(record.score_pct)),
        );
        if is_mastered(record.score_pct, mastery_pct) {
            self.completed = true;
        }
        self.history.push(record);
    }

    /// Recompute `attempts`, `best_score_pct`, `total_time_sec`,
    /// `last_attempt_at` and `item_stats` from `history`.
    fn rebuild_derived(&mut self) -> bool {
        let mut rebuilt = ModuleRecord {
            completed: self.completed,
            history: self.history.clone(),
            ..ModuleRecord::default()
        };
        for record in &rebuilt.history {
            for outcome in &record.per_question {
                let stat = rebuilt.item_stats.entry(outcome.id.clone()).or_default();
                stat.seen += 1;
                if outcome.ok {
                    stat.correct += 1;
                }
            }
            rebuilt.total_time_sec += record.elapsed_sec;
        }
        rebuilt.attempts = rebuilt.history.len() as u32;
        rebuilt.best_score_pct = rebuilt.history.iter().map(|h| h.score_pct).max();
        rebuilt.last_attempt_at = rebuilt
            .history
            .last()
            .map(|h| h.at)
            .or(self.last_attempt_at);

        let changed = rebuilt != *self;
        *self = rebuilt;
        changed
    }

    /// Human-readable descriptions of every broken invariant.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();

        if self.attempts as usize != self.history.len() {
            out.push(format!(
                "attempts is {} but history has {} entries",
                self.attempts,
                self.history.len()
            ));
        }

        let best = self.history.iter().map(|h| h.score_pct).max();
        if best != self.best_score_pct {
            out.push(format!(
                "bestScorePct is {:?} but history maximum is {:?}",
                self.best_score_pct, best
            ));
        }

        let total: u64 = self.history.iter().map(|h| h.elapsed_sec).sum();
        if total != self.total_time_sec {
            out.push(format!(
                "totalTimeSec is {} but history sums to {total}",
                self.total_time_sec
            ));
        }

        let mut derived: BTreeMap<&str, ItemStat> = BTreeMap::new();
        for outcome in self.history.iter().flat_map(|h| &h.per_question) {
            let stat = derived.entry(outcome.id.as_str()).or_default();
            stat.seen += 1;
            if outcome.ok {
                stat.correct += 1;
            }
        }
        for (id, expected) in &derived {
            match self.item_stats.get(*id) {
                Some(stat) if stat == expected => {}
                Some(stat) => out.push(format!(
                    "itemStats[{id}] is {}/{} but history gives {}/{}",
                    stat.correct, stat.seen, expected.correct, expected.seen
                )),
                None => out.push(format!("itemStats is missing {id}")),
            }
        }
        for (id, stat) in &self.item_stats {
            if stat.correct > stat.seen {
                out.push(format!(
                    "itemStats[{id}] has correct {} above seen {}",
                    stat.correct, stat.seen
                ));
            }
        }

        out
    }
}

/// A broken record invariant found by [`Progress::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// The module involved, or `None` for root-level problems.
    pub module_id: Option<String>,
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module_id {
            Some(id) => write!(f, "module {id}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
