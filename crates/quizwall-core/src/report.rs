//! Review views: per-question feedback, attempt replay, and the final review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builder::build_attempt;
use crate::model::{choice_label, Pool, ShuffledQuestion};
use crate::progress::{AttemptRecord, Progress};
use crate::settings::ModuleSettings;
use crate::statistics::final_review_unlocked;

/// Feedback for one question of an evaluated attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub id: String,
    pub prompt: String,
    pub chosen_index: Option<usize>,
    /// Label of the chosen option, if any.
    pub chosen_label: Option<char>,
    pub correct_label: char,
    pub ok: bool,
    pub explanation: String,
}

impl QuestionFeedback {
    pub fn new(question: &ShuffledQuestion, chosen: Option<usize>) -> Self {
        Self {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            chosen_index: chosen,
            chosen_label: chosen.and_then(choice_label),
            correct_label: choice_label(question.answer_index).unwrap_or('?'),
            ok: question.is_correct(chosen),
            explanation: question.explanation(chosen).to_string(),
        }
    }
}

/// A stored attempt re-derived from its seed against the current pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub questions: Vec<ShuffledQuestion>,
    pub feedback: Vec<QuestionFeedback>,
    /// False when the pool changed since the attempt was taken, so the
    /// re-derived question set no longer matches the recorded one.
    pub matches_record: bool,
}

/// Rebuild `record` from its seed and pair it with the recorded choices.
pub fn replay_attempt(pool: &Pool, settings: &ModuleSettings, record: &AttemptRecord) -> Replay {
    let questions = build_attempt(pool, record.seed, settings);

    let matches_record = questions.len() == record.per_question.len()
        && questions
            .iter()
            .zip(&record.per_question)
            .all(|(q, o)| q.id == o.id && q.answer_index == o.correct_index);
    if !matches_record {
        tracing::warn!(
            seed = record.seed,
            "pool changed since the attempt was recorded"
        );
    }

    let feedback = questions
        .iter()
        .map(|q| {
            let chosen = record
                .per_question
                .iter()
                .find(|o| o.id == q.id)
                .and_then(|o| o.chosen_index);
            QuestionFeedback::new(q, chosen)
        })
        .collect();

    Replay {
        questions,
        feedback,
        matches_record,
    }
}

/// One history row in the final review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedAttempt {
    pub at: DateTime<Utc>,
    pub score_pct: u32,
    pub correct: u32,
    pub total: u32,
    pub elapsed_sec: u64,
    pub seed: u32,
    pub auto_submit: bool,
}

impl From<&AttemptRecord> for ReviewedAttempt {
    fn from(r: &AttemptRecord) -> Self {
        Self {
            at: r.at,
            score_pct: r.score_pct,
            correct: r.correct,
            total: r.total,
            elapsed_sec: r.elapsed_sec,
            seed: r.seed,
            auto_submit: r.auto_submit,
        }
    }
}

/// A module's section of the final review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReview {
    pub module_id: String,
    pub best_score_pct: Option<u32>,
    pub total_time_sec: u64,
    pub attempts: Vec<ReviewedAttempt>,
}

/// The course-end review, available once every module is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReview {
    pub course: String,
    pub modules: Vec<ModuleReview>,
}

/// Build the final review, or `None` while any configured module is incomplete.
pub fn final_review(progress: &Progress, module_ids: &[String]) -> Option<FinalReview> {
    if !final_review_unlocked(progress, module_ids) {
        return None;
    }

    let modules = module_ids
        .iter()
        .filter_map(|id| {
            let m = progress.module(id)?;
            Some(ModuleReview {
                module_id: id.clone(),
                best_score_pct: m.best_score_pct,
                total_time_sec: m.total_time_sec,
                attempts: m.history.iter().map(ReviewedAttempt::from).collect(),
            })
        })
        .collect();

    Some(FinalReview {
        course: progress.course.clone(),
        modules,
    })
}
