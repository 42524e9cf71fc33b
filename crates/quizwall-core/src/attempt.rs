//! The attempt state machine.
//!
//! An [`Attempt`] owns everything it needs from start to evaluation: the
//! derived question set, the learner's selections, the countdown, a handle to
//! the progress store, and the clock. Commands are explicit method calls;
//! [`crate::driver::run_attempt`] feeds them from a channel and a 1 s ticker.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::builder::build_attempt;
use crate::error::{PoolLoadError, StoreError};
use crate::model::{ShuffledQuestion, CHOICE_COUNT};
use crate::progress::{AttemptRecord, ModuleRecord};
use crate::report::QuestionFeedback;
use crate::scoring::{elapsed_secs, is_mastered, score};
use crate::settings::ModuleSettings;
use crate::shuffle::derive_seed;
use crate::store::ProgressStore;
use crate::time::Clock;
use crate::traits::PoolSource;

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// Accepting answers.
    Active,
    /// Submitted and recorded. Terminal.
    Evaluated,
    /// Refused because the module is out of attempts. Terminal.
    Locked,
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptPhase::Active => write!(f, "active"),
            AttemptPhase::Evaluated => write!(f, "evaluated"),
            AttemptPhase::Locked => write!(f, "locked"),
        }
    }
}

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No timer, or the attempt is no longer active.
    Idle,
    /// Still running with this many seconds left.
    Running { remaining: u32 },
    /// The countdown reached zero and the attempt was auto-submitted.
    Expired,
}

/// What the learner sees after submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The record appended to the module history.
    pub record: AttemptRecord,
    /// The module record after this attempt was applied.
    pub module: ModuleRecord,
    /// Whether this attempt's score met the mastery threshold.
    pub mastered: bool,
    pub feedback: Vec<QuestionFeedback>,
}

/// One learner attempt at one module.
pub struct Attempt {
    module_id: String,
    settings: ModuleSettings,
    store: ProgressStore,
    clock: Arc<dyn Clock>,
    seed: u32,
    questions: Vec<ShuffledQuestion>,
    answers: HashMap<String, usize>,
    started_at: DateTime<Utc>,
    remaining: Option<u32>,
    phase: AttemptPhase,
    prior: ModuleRecord,
    evaluation: Option<Evaluation>,
}

impl fmt::Debug for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("module_id", &self.module_id)
            .field("seed", &self.seed)
            .field("phase", &self.phase)
            .field("questions", &self.questions.len())
            .field("answered", &self.answers.len())
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl Attempt {
    /// Start an attempt at `module_id`.
    ///
    /// A locked module yields an attempt in [`AttemptPhase::Locked`] without
    /// touching `source`. Otherwise the pool is fetched and the question set
    /// derived from `seed`, or from a fresh seed when `None`.
    pub async fn start(
        module_id: &str,
        settings: ModuleSettings,
        source: &dyn PoolSource,
        store: ProgressStore,
        seed: Option<u32>,
    ) -> Result<Attempt, PoolLoadError> {
        let clock = store.clock().clone();
        let prior = store.load().module(module_id).cloned().unwrap_or_default();
        let seed = seed.unwrap_or_else(derive_seed);

        let mut attempt = Attempt {
            module_id: module_id.to_string(),
            started_at: clock.now(),
            remaining: None,
            phase: AttemptPhase::Locked,
            questions: Vec::new(),
            answers: HashMap::new(),
            evaluation: None,
            settings,
            store,
            clock,
            seed,
            prior,
        };

        if attempt.prior.is_locked(&attempt.settings) {
            tracing::info!(
                module_id,
                attempts = attempt.prior.attempts,
                "module locked, attempt refused"
            );
            return Ok(attempt);
        }

        let pool = source.fetch_pool(module_id).await?;
        attempt.questions = build_attempt(&pool, seed, &attempt.settings);
        attempt.started_at = attempt.clock.now();
        attempt.remaining = attempt
            .settings
            .has_timer()
            .then_some(attempt.settings.time_limit_seconds);
        attempt.phase = AttemptPhase::Active;

        tracing::debug!(
            module_id,
            source = source.name(),
            seed,
            questions = attempt.questions.len(),
            "attempt started"
        );
        Ok(attempt)
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn settings(&self) -> &ModuleSettings {
        &self.settings
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn questions(&self) -> &[ShuffledQuestion] {
        &self.questions
    }

    /// The module record as it stood when the attempt started.
    pub fn prior_record(&self) -> &ModuleRecord {
        &self.prior
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The learner's current selection for `question_id`.
    pub fn answer(&self, question_id: &str) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Seconds left on the countdown; `None` without a timer or after submission.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining
    }

    pub fn has_timer(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Record the learner's choice, replacing any earlier one.
    ///
    /// Returns false (and changes nothing) unless the attempt is active, the
    /// question belongs to it, and `index` names one of its options.
    pub fn select_answer(&mut self, question_id: &str, index: usize) -> bool {
        if self.phase != AttemptPhase::Active || index >= CHOICE_COUNT {
            return false;
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return false;
        }
        self.answers.insert(question_id.to_string(), index);
        true
    }

    /// Grade the attempt and record it in the progress store.
    ///
    /// Only the first call on an active attempt does anything; later calls
    /// return `Ok(None)`. The countdown stops as soon as this runs.
    pub fn submit(&mut self, auto_submit: bool) -> Result<Option<&Evaluation>, StoreError> {
        if self.phase != AttemptPhase::Active {
            return Ok(None);
        }
        self.phase = AttemptPhase::Evaluated;
        self.remaining = None;

        let now = self.clock.now();
        let scorecard = score(&self.questions, &self.answers);
        let feedback = self
            .questions
            .iter()
            .map(|q| QuestionFeedback::new(q, self.answers.get(&q.id).copied()))
            .collect();
        let record = scorecard.into_record(
            now,
            self.seed,
            auto_submit,
            elapsed_secs(self.started_at, now),
        );
        let mastered = is_mastered(record.score_pct, self.settings.mastery_pct);

        let mut progress = self.store.load();
        self.store.record_attempt(
            &mut progress,
            &self.module_id,
            record.clone(),
            self.settings.mastery_pct,
        )?;

        self.evaluation = Some(Evaluation {
            module: progress
                .module(&self.module_id)
                .cloned()
                .unwrap_or_default(),
            record,
            mastered,
            feedback,
        });
        Ok(self.evaluation.as_ref())
    }

    /// Advance the countdown by one second, auto-submitting at zero.
    pub fn tick(&mut self) -> Result<TickOutcome, StoreError> {
        if self.phase != AttemptPhase::Active {
            return Ok(TickOutcome::Idle);
        }
        let Some(remaining) = self.remaining else {
            return Ok(TickOutcome::Idle);
        };

        let remaining = remaining.saturating_sub(1);
        self.remaining = Some(remaining);
        if remaining > 0 {
            return Ok(TickOutcome::Running { remaining });
        }

        tracing::debug!(module_id = %self.module_id, "time limit reached");
        self.submit(true)?;
        Ok(TickOutcome::Expired)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::builder::tests::pool;
    use crate::store::{MemoryBackend, StoreIdentity};
    use crate::time::{fixed_clock, ManualClock};
    use crate::traits::MemoryPoolSource;

    pub(crate) fn fixture(questions: usize) -> (MemoryPoolSource, ProgressStore, Arc<ManualClock>) {
        let source = MemoryPoolSource::new().with_pool("01", pool(questions));
        let clock = Arc::new(fixed_clock());
        let store = ProgressStore::new(
            Arc::new(MemoryBackend::new()),
            StoreIdentity::for_course("8G103"),
        )
        .with_clock(clock.clone());
        (source, store, clock)
    }

    fn answer_all_correctly(attempt: &mut Attempt) {
        let picks: Vec<(String, usize)> = attempt
            .questions()
            .iter()
            .map(|q| (q.id.clone(), q.answer_index))
            .collect();
        for (id, index) in picks {
            assert!(attempt.select_answer(&id, index));
        }
    }

    #[tokio::test]
    async fn perfect_attempt_completes_module() {
        let (source, store, clock) = fixture(4);
        let mut attempt = Attempt::start(
            "01",
            ModuleSettings::default(),
            &source,
            store.clone(),
            Some(42),
        )
        .await
        .unwrap();
        assert_eq!(attempt.phase(), AttemptPhase::Active);
        assert_eq!(attempt.seed(), 42);
        assert_eq!(attempt.questions().len(), 4);
        assert!(!attempt.has_timer());

        answer_all_correctly(&mut attempt);
        clock.advance(chrono::Duration::seconds(95));

        let eval = attempt.submit(false).unwrap().unwrap().clone();
        assert_eq!(eval.record.score_pct, 100);
        assert_eq!(eval.record.correct, 4);
        assert_eq!(eval.record.elapsed_sec, 95);
        assert_eq!(eval.record.seed, 42);
        assert!(eval.mastered);
        assert!(eval.module.completed);
        assert!(eval.feedback.iter().all(|f| f.ok));

        let stored = store.load();
        let m = stored.module("01").unwrap();
        assert_eq!(m.attempts, 1);
        assert!(m.completed);
        assert_eq!(m.best_score_pct, Some(100));
        assert_eq!(m.item_stats.len(), 4);
    }

    #[tokio::test]
    async fn same_seed_same_questions() {
        let (source, store, _) = fixture(20);
        let a = Attempt::start(
            "01",
            ModuleSettings::default(),
            &source,
            store.clone(),
            Some(7),
        )
        .await
        .unwrap();
        let b = Attempt::start("01", ModuleSettings::default(), &source, store, Some(7))
            .await
            .unwrap();
        assert_eq!(a.questions(), b.questions());
        assert_eq!(a.questions().len(), 10);
    }

    #[tokio::test]
    async fn third_failure_locks_module() {
        let (source, store, _) = fixture(4);
        let settings = ModuleSettings::default();
        for _ in 0..3 {
            let mut attempt = Attempt::start("01", settings.clone(), &source, store.clone(), None)
                .await
                .unwrap();
            assert_eq!(attempt.phase(), AttemptPhase::Active);
            let eval = attempt.submit(false).unwrap().unwrap();
            assert_eq!(eval.record.score_pct, 0);
        }
        assert_eq!(source.fetch_count(), 3);

        let mut locked = Attempt::start("01", settings, &source, store.clone(), None)
            .await
            .unwrap();
        assert_eq!(locked.phase(), AttemptPhase::Locked);
        assert_eq!(source.fetch_count(), 3);
        assert!(locked.questions().is_empty());
        assert_eq!(locked.prior_record().attempts, 3);
        assert!(!locked.select_answer("q00", 0));
        assert!(locked.submit(false).unwrap().is_none());
        assert_eq!(locked.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(store.load().module("01").unwrap().attempts, 3);
    }

    #[tokio::test]
    async fn mastery_lifts_the_lock() {
        let (source, store, _) = fixture(4);
        let settings = ModuleSettings {
            attempt_limit: 1,
            ..ModuleSettings::default()
        };
        let mut attempt = Attempt::start("01", settings.clone(), &source, store.clone(), None)
            .await
            .unwrap();
        answer_all_correctly(&mut attempt);
        attempt.submit(false).unwrap();

        let next = Attempt::start("01", settings, &source, store, None)
            .await
            .unwrap();
        assert_eq!(next.phase(), AttemptPhase::Active);
    }

    #[tokio::test]
    async fn countdown_auto_submits() {
        let (source, store, clock) = fixture(4);
        let settings = ModuleSettings {
            time_limit_seconds: 5,
            ..ModuleSettings::default()
        };
        let mut attempt = Attempt::start("01", settings, &source, store.clone(), Some(3))
            .await
            .unwrap();
        assert_eq!(attempt.remaining_seconds(), Some(5));
        let first = attempt.questions()[0].clone();
        attempt.select_answer(&first.id, first.answer_index);

        for expected in (1..5).rev() {
            clock.advance(chrono::Duration::seconds(1));
            assert_eq!(
                attempt.tick().unwrap(),
                TickOutcome::Running {
                    remaining: expected,
                }
            );
        }
        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(attempt.tick().unwrap(), TickOutcome::Expired);
        assert_eq!(attempt.phase(), AttemptPhase::Evaluated);
        assert_eq!(attempt.remaining_seconds(), None);

        let eval = attempt.evaluation().unwrap();
        assert!(eval.record.auto_submit);
        assert_eq!(eval.record.elapsed_sec, 5);
        assert_eq!(eval.record.correct, 1);
        assert_eq!(eval.record.score_pct, 25);
        let unanswered: Vec<_> = eval
            .record
            .per_question
            .iter()
            .filter(|o| o.id != first.id)
            .collect();
        assert_eq!(unanswered.len(), 3);
        assert!(unanswered.iter().all(|o| !o.ok && o.chosen_index.is_none()));

        assert_eq!(attempt.tick().unwrap(), TickOutcome::Idle);
        assert!(attempt.submit(false).unwrap().is_none());
        assert_eq!(store.load().module("01").unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn submit_is_idempotent() {
        let (source, store, _) = fixture(4);
        let mut attempt = Attempt::start(
            "01",
            ModuleSettings::default(),
            &source,
            store.clone(),
            None,
        )
        .await
        .unwrap();
        let first = attempt.submit(false).unwrap().cloned();
        assert!(first.is_some());
        assert!(attempt.submit(false).unwrap().is_none());
        assert!(attempt.submit(true).unwrap().is_none());
        assert_eq!(attempt.evaluation(), first.as_ref());
        assert_eq!(store.load().module("01").unwrap().history.len(), 1);
        // Zero elapsed wall time still counts one second.
        assert_eq!(first.unwrap().record.elapsed_sec, 1);
    }

    #[tokio::test]
    async fn selections_are_validated_and_overwritten() {
        let (source, store, _) = fixture(4);
        let mut attempt = Attempt::start("01", ModuleSettings::default(), &source, store, None)
            .await
            .unwrap();
        let id = attempt.questions()[0].id.clone();

        assert!(!attempt.select_answer("nope", 0));
        assert!(!attempt.select_answer(&id, 4));
        assert_eq!(attempt.answer(&id), None);

        assert!(attempt.select_answer(&id, 1));
        assert!(attempt.select_answer(&id, 3));
        assert_eq!(attempt.answer(&id), Some(3));
        assert_eq!(attempt.answered_count(), 1);

        attempt.submit(false).unwrap();
        assert!(!attempt.select_answer(&id, 0));
        let recorded = &attempt.evaluation().unwrap().record;
        assert_eq!(recorded.per_question[0].chosen_index, Some(3));
    }

    #[tokio::test]
    async fn missing_pool_fails_start() {
        let (source, store, _) = fixture(4);
        let err = Attempt::start(
            "09",
            ModuleSettings::default(),
            &source,
            store.clone(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PoolLoadError::NotFound(_)));
        assert!(store.load().module("09").is_none());
    }
}
