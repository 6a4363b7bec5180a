//! Post-submission answer review.

use learnpath_core::{Question, QuestionId};
use serde::Serialize;

/// Outcome of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// The stored answer matches
    Correct,
    /// An answer was given and it is wrong
    IncorrectSelected,
    /// No answer was given
    Unselected,
}

/// Highlight of one choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionMark {
    /// This is the right choice
    Correct,
    /// The learner picked this and it is wrong
    Incorrect,
    /// Neither
    Unmarked,
}

/// One choice of a question, with its review mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionReview {
    /// Submitted value
    pub value: String,
    /// Display text
    pub label: String,
    /// Highlight
    pub mark: OptionMark,
}

/// Review of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReview {
    /// Question id
    pub id: QuestionId,
    /// Prompt text
    pub question: String,
    /// Outcome
    pub status: ReviewStatus,
    /// The learner's answer, if any
    pub given: Option<String>,
    /// The answer key
    pub correct_answer: String,
    /// Choices with marks; empty for free-text questions
    pub options: Vec<OptionReview>,
    /// Explanation text
    pub explanation: Option<String>,
}

impl QuestionReview {
    pub(crate) fn new(id: QuestionId, question: &Question, given: Option<&str>) -> Self {
        let status = match given {
            None => ReviewStatus::Unselected,
            Some(answer) if question.is_correct(answer) => ReviewStatus::Correct,
            Some(_) => ReviewStatus::IncorrectSelected,
        };

        let options = question
            .option_values()
            .into_iter()
            .map(|value| {
                let mark = if question.is_correct(&value) {
                    OptionMark::Correct
                } else if given == Some(value.as_str()) {
                    OptionMark::Incorrect
                } else {
                    OptionMark::Unmarked
                };
                OptionReview {
                    label: question.option_label(&value),
                    value,
                    mark,
                }
            })
            .collect();

        Self {
            id,
            question: question.question.clone(),
            status,
            given: given.map(str::to_string),
            correct_answer: question.answer_key(),
            options,
            explanation: question.explanation.clone(),
        }
    }
}
