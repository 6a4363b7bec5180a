//! learnpath core data models.
//!
//! This crate defines the course catalog, the persisted progress document,
//! quiz definitions and the small value types shared by the other crates.

#![warn(missing_docs)]

// Identities and catalog
mod id;
pub mod catalog;

// Persisted state
mod progress;
mod achievement;
mod theme;

// Quiz content
mod quiz;

pub mod time;

// Re-exports
pub use id::{LessonId, ModuleId, ParseIdError, QuestionId};
pub use catalog::{ModuleInfo, MODULE_COUNT, TOTAL_LESSONS};
pub use progress::{
    percentage, LessonState, LookupError, ModuleProgress, ProgressDocument, QuizAttempt,
    QuizRecord, DOCUMENT_VERSION, PASSING_PERCENTAGE,
};
pub use achievement::Achievement;
pub use theme::Theme;
pub use quiz::{answer_string, Question, QuestionType, QuizDefinition};
pub use time::Clock;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
