use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::draft::QuizDraft;
use crate::error::QuizError;

/// Validated quiz with options in random order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

/// Repair, shuffle and index a draft
///
/// The correct answer is appended when no option equals it exactly, so
/// the output may hold more options than the draft. Options are never
/// trimmed, case-folded or deduplicated; the index points at the first
/// option equal to the answer.
///
/// # Errors
///
/// Returns `QuizError::Validation` if the draft has no correct answer
///
/// # Panics
///
/// Panics if the answer is missing after repair, which cannot happen
pub fn normalize<R: Rng + ?Sized>(draft: QuizDraft, rng: &mut R) -> Result<QuizRecord, QuizError> {
    let QuizDraft {
        question,
        mut options,
        correct_answer,
        explanation,
    } = draft;

    if correct_answer.is_empty() {
        return Err(QuizError::Validation("correct answer is missing".to_string()));
    }

    if !options.contains(&correct_answer) {
        options.push(correct_answer.clone());
    }

    options.shuffle(rng);

    let correct_answer_index = options
        .iter()
        .position(|option| *option == correct_answer)
        .expect("correct answer is present after repair");

    Ok(QuizRecord {
        question,
        options,
        correct_answer_index,
        explanation,
    })
}
