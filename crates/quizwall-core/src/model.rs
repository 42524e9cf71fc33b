//! Core data model types for quizwall.
//!
//! Questions and pools are loaded from external JSON assets and never
//! mutated; an attempt works on its own [`ShuffledQuestion`] copies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every question offers exactly this many choices.
pub const CHOICE_COUNT: usize = 4;

/// A single multiple-choice question as stored in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier, unique within its pool.
    pub id: String,
    /// The question text.
    pub prompt: String,
    /// The four answer options, in authoring order.
    pub choices: [String; CHOICE_COUNT],
    /// Index of the correct option in `choices`.
    pub answer_index: usize,
    /// Free-form topic tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Explanation shown when the learner answers correctly.
    #[serde(default)]
    pub explain_correct: String,
    /// Explanations for wrong options, keyed by option index.
    #[serde(default)]
    pub explain_incorrect: BTreeMap<usize, String>,
}

/// The full, unshuffled candidate set for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Pool {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A per-attempt copy of a [`Question`] with its options permuted.
///
/// `answer_index` and the keys of `explain_incorrect` refer to the new
/// positions. `source_positions[i]` is the authoring index of the option now
/// shown at position `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffledQuestion {
    pub id: String,
    pub prompt: String,
    pub choices: [String; CHOICE_COUNT],
    pub answer_index: usize,
    pub tags: Vec<String>,
    pub explain_correct: String,
    pub explain_incorrect: BTreeMap<usize, String>,
    pub source_positions: [usize; CHOICE_COUNT],
}

const FALLBACK_CORRECT: &str = "Correct (add explanation).";
const FALLBACK_INCORRECT: &str = "Incorrect (add explanation).";

fn non_blank(text: &str) -> Option<&str> {
    (!text.trim().is_empty()).then_some(text)
}

impl ShuffledQuestion {
    /// Whether `chosen` is the correct option.
    pub fn is_correct(&self, chosen: Option<usize>) -> bool {
        chosen == Some(self.answer_index)
    }

    /// The explanation to show for the learner's choice.
    ///
    /// Blank explanation text falls back to a placeholder.
    pub fn explanation(&self, chosen: Option<usize>) -> &str {
        if self.is_correct(chosen) {
            non_blank(&self.explain_correct).unwrap_or(FALLBACK_CORRECT)
        } else {
            chosen
                .and_then(|c| self.explain_incorrect.get(&c))
                .map(String::as_str)
                .and_then(non_blank)
                .unwrap_or(FALLBACK_INCORRECT)
        }
    }

    /// `"B. option text"` for display.
    pub fn labeled_choice(&self, index: usize) -> Option<String> {
        let text = self.choices.get(index)?;
        Some(format!("{}. {text}", choice_label(index)?))
    }
}

/// Letter label (`A`..`D`) for an option index.
pub fn choice_label(index: usize) -> Option<char> {
    if index < CHOICE_COUNT {
        Some((b'A' + index as u8) as char)
    } else {
        None
    }
}

/// Parse a learner-entered option (`"b"`, `"B"`, or `"2"`) into an index.
pub fn parse_choice(input: &str) -> Option<usize> {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let index = match c.to_ascii_uppercase() {
        'A'..='D' => c.to_ascii_uppercase() as usize - 'A' as usize,
        '1'..='4' => c as usize - '1' as usize,
        _ => return None,
    };
    Some(index)
}
