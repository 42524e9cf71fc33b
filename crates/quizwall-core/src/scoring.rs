//! Scoring and mastery evaluation.
//!
//! All percentages are integers in `[0, 100]`, rounded half-up with integer
//! arithmetic so results never depend on float formatting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ShuffledQuestion;
use crate::progress::{AttemptRecord, QuestionOutcome};

/// `round(100 * numerator / denominator)` with half-up rounding; 0 when the
/// denominator is 0.
pub fn percent(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((200 * numerator + denominator) / (2 * denominator)) as u32
}

/// Half-up rounded mean of `values`; 0 when empty.
pub fn rounded_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    let n = values.len() as u64;
    ((2 * sum + n) / (2 * n)) as u32
}

/// Whole seconds between `started_at` and `now`, floored, never below 1.
pub fn elapsed_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let secs = (now - started_at).num_seconds();
    secs.max(1) as u64
}

/// Whether `score_pct` meets the mastery threshold.
pub fn is_mastered(score_pct: u32, mastery_pct: u8) -> bool {
    score_pct >= u32::from(mastery_pct)
}

/// The graded result of one attempt, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub correct: u32,
    pub total: u32,
    pub score_pct: u32,
    pub per_question: Vec<QuestionOutcome>,
}

/// Grade `answers` (question id → chosen shuffled index) against `questions`.
///
/// Questions without an answer are incorrect with no chosen index.
pub fn score(questions: &[ShuffledQuestion], answers: &HashMap<String, usize>) -> Scorecard {
    let per_question: Vec<QuestionOutcome> = questions
        .iter()
        .map(|q| {
            let chosen = answers.get(&q.id).copied();
            QuestionOutcome {
                id: q.id.clone(),
                chosen_index: chosen,
                correct_index: q.answer_index,
                ok: q.is_correct(chosen),
            }
        })
        .collect();

    let correct = per_question.iter().filter(|o| o.ok).count() as u32;
    let total = per_question.len() as u32;

    Scorecard {
        correct,
        total,
        score_pct: percent(u64::from(correct), u64::from(total)),
        per_question,
    }
}

impl Scorecard {
    /// Turn the scorecard into an append-only history record.
    pub fn into_record(
        self,
        at: DateTime<Utc>,
        seed: u32,
        auto_submit: bool,
        elapsed_sec: u64,
    ) -> AttemptRecord {
        AttemptRecord {
            at,
            seed,
            auto_submit,
            score_pct: self.score_pct,
            correct: self.correct,
            total: self.total,
            elapsed_sec: elapsed_sec.max(1),
            per_question: self.per_question,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::shuffle_options;
    use crate::builder::tests::question;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13); // 12.5
        assert_eq!(percent(5, 8), 63); // 62.5
        assert_eq!(percent(7, 7), 100);
        assert_eq!(percent(0, 5), 0);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn rounded_mean_half_up() {
        assert_eq!(rounded_mean(&[]), 0);
        assert_eq!(rounded_mean(&[80, 85]), 83); // 82.5
        assert_eq!(rounded_mean(&[100, 70, 90]), 87); // 86.67
    }

    #[test]
    fn elapsed_floors_and_clamps() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(elapsed_secs(start, start), 1);
        let later = start + chrono::Duration::milliseconds(2_999);
        assert_eq!(elapsed_secs(start, later), 2);
        let earlier = start - chrono::Duration::seconds(30);
        assert_eq!(elapsed_secs(start, earlier), 1);
        let later = start + chrono::Duration::seconds(95);
        assert_eq!(elapsed_secs(start, later), 95);
    }

    #[test]
    fn mastery_threshold_is_inclusive() {
        assert!(is_mastered(80, 80));
        assert!(!is_mastered(79, 80));
        assert!(is_mastered(70, 70));
    }

    #[test]
    fn unanswered_questions_are_wrong() {
        let questions: Vec<ShuffledQuestion> = ["a", "b", "c"]
            .iter()
            .map(|id| shuffle_options(&question(id, 0), 11))
            .collect();
        let mut answers = HashMap::new();
        answers.insert("a".to_string(), questions[0].answer_index);
        answers.insert("b".to_string(), (questions[1].answer_index + 1) % 4);

        let card = score(&questions, &answers);
        assert_eq!(card.correct, 1);
        assert_eq!(card.total, 3);
        assert_eq!(card.score_pct, 33);
        assert!(card.per_question[0].ok);
        assert!(!card.per_question[1].ok);
        assert_eq!(card.per_question[2].chosen_index, None);
        assert!(!card.per_question[2].ok);
        assert_eq!(
            card.per_question[2].correct_index,
            questions[2].answer_index
        );
    }

    #[test]
    fn empty_attempt_scores_zero() {
        let card = score(&[], &HashMap::new());
        assert_eq!(card.total, 0);
        assert_eq!(card.score_pct, 0);
    }
}
