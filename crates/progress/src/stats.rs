//! Learning statistics and achievements.

use learnpath_core::{Achievement, ProgressDocument, Time, TOTAL_LESSONS};
use serde::Serialize;

/// Aggregate numbers over a progress document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Lessons in the course
    pub total_lessons: u32,
    /// Lessons completed
    pub completed_lessons: u32,
    /// Rounded overall completion
    pub overall_percentage: u32,
    /// Modules with every lesson completed
    pub modules_completed: usize,
    /// Quizzes passed at least once
    pub quizzes_completed: usize,
    /// Quizzes with a best score of 100
    pub perfect_quizzes: usize,
    /// When tracking began
    pub started_at: Time,
    /// Last persisted change
    pub last_updated: Time,
    /// Whole days since tracking began
    pub days_active: i64,
}

impl Statistics {
    /// Compute statistics as of `now`.
    pub fn from_document(doc: &ProgressDocument, now: Time) -> Self {
        Self {
            total_lessons: TOTAL_LESSONS,
            completed_lessons: doc.total_lessons_completed,
            overall_percentage: doc.overall_percentage(),
            modules_completed: doc.modules_completed(),
            quizzes_completed: doc.quizzes_passed(),
            perfect_quizzes: doc.perfect_quizzes(),
            started_at: doc.started_at,
            last_updated: doc.last_updated,
            days_active: (now - doc.started_at).num_days().max(0),
        }
    }
}

/// Badges unlocked by a document, in display order.
pub fn achievements(doc: &ProgressDocument) -> Vec<Achievement> {
    let overall = doc.overall_percentage();

    Achievement::ALL
        .into_iter()
        .filter(|achievement| match achievement {
            Achievement::FirstSteps => doc.total_lessons_completed >= 1,
            Achievement::ModuleMaster => doc.modules_completed() >= 1,
            Achievement::HalfwayThere => overall >= 50,
            Achievement::FullStackDeveloper => overall == 100,
            Achievement::QuizMaster => doc.quizzes_passed() >= 10,
            Achievement::PerfectScholar => doc.perfect_quizzes() >= 5,
        })
        .collect()
}
