//! Quiz session errors.

use learnpath_core::QuestionId;
use learnpath_progress::ProgressError;

/// Result type for quiz operations.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors reported by a quiz session.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A quiz needs at least one question
    #[error("quiz has no questions")]
    EmptyQuiz,

    /// Question id outside the quiz
    #[error("question {0} not found")]
    UnknownQuestion(QuestionId),

    /// The session was already submitted
    #[error("quiz already submitted")]
    AlreadySubmitted,

    /// Recording the attempt failed
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
