//! Quiz sessions
//!
//! One attempt at a module quiz: navigation, answers, scoring against the
//! progress store, answer review and the optional countdown timer.

#![warn(missing_docs)]

pub mod error;
pub mod feedback;
pub mod review;
pub mod session;
pub mod timer;

pub use error::{QuizError, Result};
pub use feedback::Feedback;
pub use review::{OptionMark, OptionReview, QuestionReview, ReviewStatus};
pub use session::{
    unanswered_prompt, QuizProgress, QuizResult, QuizSession, QuizStatistics, SubmitOutcome,
    RETAKE_PROMPT,
};
pub use timer::{format_remaining, QuizTimer, WARNING_SECONDS};
