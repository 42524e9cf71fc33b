//! Attempt construction: question subset selection and option shuffling.

use std::collections::BTreeMap;

use crate::model::{Pool, Question, ShuffledQuestion, CHOICE_COUNT};
use crate::settings::ModuleSettings;
use crate::shuffle::{permutation, seeded_shuffle};

/// Offset added to the attempt seed (plus the question position) to derive
/// each question's option seed.
pub const OPTION_SEED_OFFSET: u32 = 17;

/// Option-shuffle seed for the question at `position` in an attempt.
pub fn option_seed(seed: u32, position: usize) -> u32 {
    seed.wrapping_add(position as u32)
        .wrapping_add(OPTION_SEED_OFFSET)
}

/// Permute a question's options with `seed`, remapping the answer index and
/// wrong-answer explanations to the new positions.
pub fn shuffle_options(question: &Question, seed: u32) -> ShuffledQuestion {
    let order = permutation(CHOICE_COUNT, seed);
    let mut source_positions = [0usize; CHOICE_COUNT];
    source_positions.copy_from_slice(&order);

    let choices: [String; CHOICE_COUNT] =
        std::array::from_fn(|new| question.choices[source_positions[new]].clone());

    let answer_index = source_positions
        .iter()
        .position(|&old| old == question.answer_index)
        .unwrap_or(question.answer_index);

    let mut explain_incorrect = BTreeMap::new();
    for (new, &old) in source_positions.iter().enumerate() {
        if old == question.answer_index {
            continue;
        }
        if let Some(text) = question.explain_incorrect.get(&old) {
            explain_incorrect.insert(new, text.clone());
        }
    }

    ShuffledQuestion {
        id: question.id.clone(),
        prompt: question.prompt.clone(),
        choices,
        answer_index,
        tags: question.tags.clone(),
        explain_correct: question.explain_correct.clone(),
        explain_incorrect,
        source_positions,
    }
}

/// Build the ordered, option-shuffled question list for one attempt.
///
/// The same pool content, seed, and settings always produce the same result.
pub fn build_attempt(pool: &Pool, seed: u32, settings: &ModuleSettings) -> Vec<ShuffledQuestion> {
    let eligible = settings.effective_pool_size(pool.len());
    let pick = settings.effective_pick_count(pool.len());

    let picked = seeded_shuffle(&pool.questions[..eligible], seed);

    let questions: Vec<ShuffledQuestion> = picked
        .iter()
        .take(pick)
        .enumerate()
        .map(|(position, q)| shuffle_options(q, option_seed(seed, position)))
        .collect();

    tracing::debug!(
        seed,
        eligible,
        picked = questions.len(),
        "built attempt question set"
    );
    questions
}
