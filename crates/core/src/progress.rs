//! Progress document - the persisted record of lesson and quiz state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, TOTAL_LESSONS};
use crate::id::{LessonId, ModuleId};
use crate::Time;

/// Schema version written into new documents.
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// Minimum quiz percentage that counts as a pass.
pub const PASSING_PERCENTAGE: u32 = 70;

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    ((200 * part + whole) / (2 * whole)) as u32
}

/// Placeholder for timestamps missing from a stored document; `repair` replaces it.
fn unset_time() -> Time {
    chrono::DateTime::<chrono::Utc>::UNIX_EPOCH
}

/// A module or lesson id that the document does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Module id outside the course
    #[error("module {0} not found")]
    UnknownModule(ModuleId),

    /// Lesson id outside the module
    #[error("lesson {lesson} not found in module {module}")]
    UnknownLesson {
        /// Module that was searched
        module: ModuleId,
        /// Lesson that was not found
        lesson: LessonId,
    },
}

/// The whole persisted progress state.
///
/// Invariants kept by every mutating method:
/// `modules[m].completed` is the number of completed lessons in `m`, and
/// `total_lessons_completed` is the sum of those counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    /// Schema version
    pub version: String,

    /// When tracking began
    #[serde(default = "unset_time")]
    pub started_at: Time,

    /// Last persisted mutation
    #[serde(default = "unset_time")]
    pub last_updated: Time,

    /// Sum of completed lessons across modules
    #[serde(default)]
    pub total_lessons_completed: u32,

    /// Lesson progress per module
    pub modules: BTreeMap<ModuleId, ModuleProgress>,

    /// Quiz results per module
    #[serde(default)]
    pub quizzes: BTreeMap<ModuleId, QuizRecord>,
}

/// Lesson progress inside one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleProgress {
    /// Completed lessons
    pub completed: u32,

    /// Lessons in the module
    pub total: u32,

    /// State of each lesson
    pub lessons: BTreeMap<LessonId, LessonState>,
}

/// Completion state of a single lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LessonState {
    /// Whether the lesson is done
    pub completed: bool,

    /// When it was first marked done
    pub completed_at: Option<Time>,

    /// Number of completion attempts
    pub attempts: u32,
}

/// Accumulated quiz results for a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizRecord {
    /// Passed at least once
    pub completed: bool,

    /// Number of submitted attempts
    pub attempts: u32,

    /// Best percentage over all attempts
    pub best_score: u32,

    /// Most recent attempt
    pub last_attempt: Option<QuizAttempt>,
}

/// One submitted quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    /// Submission time
    pub date: Time,

    /// Correct answers
    pub score: u32,

    /// Questions in the quiz
    pub total: u32,

    /// Rounded percentage
    pub percentage: u32,
}

impl ModuleProgress {
    fn new(total: u8) -> Self {
        Self {
            completed: 0,
            total: u32::from(total),
            lessons: (1..=total)
                .map(|l| (LessonId::new(l), LessonState::default()))
                .collect(),
        }
    }

    /// Whether every lesson in the module is done.
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    /// Completion percentage of this module.
    pub fn percentage(&self) -> u32 {
        percentage(self.completed, self.total)
    }

    fn count_completed(&self) -> u32 {
        self.lessons.values().filter(|l| l.completed).count() as u32
    }
}

impl QuizRecord {
    /// Fold a new attempt into the record and return its percentage.
    pub fn record(&mut self, score: u32, total: u32, at: Time) -> u32 {
        let pct = percentage(score, total);
        self.attempts += 1;
        self.last_attempt = Some(QuizAttempt {
            date: at,
            score,
            total,
            percentage: pct,
        });
        self.best_score = self.best_score.max(pct);
        if pct >= PASSING_PERCENTAGE {
            self.completed = true;
        }
        pct
    }
}

impl ProgressDocument {
    /// A fresh document with every lesson incomplete.
    pub fn new(now: Time) -> Self {
        let modules = catalog::MODULES
            .iter()
            .map(|m| (ModuleId::new(m.id), ModuleProgress::new(m.lessons)))
            .collect();
        let quizzes = catalog::module_ids()
            .map(|id| (id, QuizRecord::default()))
            .collect();

        Self {
            version: DOCUMENT_VERSION.to_string(),
            started_at: now,
            last_updated: now,
            total_lessons_completed: 0,
            modules,
            quizzes,
        }
    }

    /// Progress of one module.
    pub fn module(&self, id: ModuleId) -> Option<&ModuleProgress> {
        self.modules.get(&id)
    }

    /// Quiz record of one module.
    pub fn quiz(&self, id: ModuleId) -> Option<&QuizRecord> {
        self.quizzes.get(&id)
    }

    /// State of one lesson.
    pub fn lesson(&self, module: ModuleId, lesson: LessonId) -> Option<&LessonState> {
        self.modules.get(&module)?.lessons.get(&lesson)
    }

    /// Mark a lesson done. Counters move only on the first completion;
    /// `attempts` grows on every call. Returns whether the lesson was newly completed.
    pub fn complete_lesson(
        &mut self,
        module: ModuleId,
        lesson: LessonId,
        now: Time,
    ) -> Result<bool, LookupError> {
        let progress = self
            .modules
            .get_mut(&module)
            .ok_or(LookupError::UnknownModule(module))?;
        let state = progress
            .lessons
            .get_mut(&lesson)
            .ok_or(LookupError::UnknownLesson { module, lesson })?;

        let newly = !state.completed;
        if newly {
            state.completed = true;
            state.completed_at = Some(now);
            progress.completed += 1;
            self.total_lessons_completed += 1;
        }
        state.attempts += 1;
        Ok(newly)
    }

    /// Mark a lesson not done. Returns whether it was previously completed.
    pub fn uncomplete_lesson(
        &mut self,
        module: ModuleId,
        lesson: LessonId,
    ) -> Result<bool, LookupError> {
        let progress = self
            .modules
            .get_mut(&module)
            .ok_or(LookupError::UnknownModule(module))?;
        let state = progress
            .lessons
            .get_mut(&lesson)
            .ok_or(LookupError::UnknownLesson { module, lesson })?;

        let was_completed = state.completed;
        if was_completed {
            state.completed = false;
            state.completed_at = None;
            progress.completed = progress.completed.saturating_sub(1);
            self.total_lessons_completed = self.total_lessons_completed.saturating_sub(1);
        }
        Ok(was_completed)
    }

    /// Record a quiz attempt for a module and return the updated record.
    pub fn record_quiz_attempt(
        &mut self,
        module: ModuleId,
        score: u32,
        total: u32,
        now: Time,
    ) -> Result<&QuizRecord, LookupError> {
        let record = self
            .quizzes
            .get_mut(&module)
            .ok_or(LookupError::UnknownModule(module))?;
        record.record(score, total, now);
        Ok(&*record)
    }

    /// Overall completion, `round(100 * completed / 73)`.
    pub fn overall_percentage(&self) -> u32 {
        percentage(self.total_lessons_completed, TOTAL_LESSONS)
    }

    /// First incomplete lesson in course order.
    pub fn next_incomplete_lesson(&self) -> Option<(ModuleId, LessonId)> {
        catalog::module_ids().find_map(|module_id| {
            let module = self.modules.get(&module_id)?;
            module
                .lessons
                .iter()
                .find(|(_, state)| !state.completed)
                .map(|(lesson_id, _)| (module_id, *lesson_id))
        })
    }

    /// Number of fully completed modules.
    pub fn modules_completed(&self) -> usize {
        catalog::module_ids()
            .filter(|id| self.modules.get(id).is_some_and(ModuleProgress::is_complete))
            .count()
    }

    /// Number of passed quizzes.
    pub fn quizzes_passed(&self) -> usize {
        self.quizzes.values().filter(|q| q.completed).count()
    }

    /// Number of quizzes with a perfect best score.
    pub fn perfect_quizzes(&self) -> usize {
        self.quizzes.values().filter(|q| q.best_score == 100).count()
    }

    /// Whether the derived counters agree with the lesson states.
    pub fn is_consistent(&self) -> bool {
        let modules_ok = self
            .modules
            .values()
            .all(|m| m.completed == m.count_completed());
        let sum: u32 = self.modules.values().map(|m| m.completed).sum();
        modules_ok && sum == self.total_lessons_completed
    }

    /// Bring a document read from outside back in line with the catalog.
    ///
    /// Adds missing modules, lessons and quiz records, drops entries the
    /// course does not have, restores module totals and recomputes every
    /// counter. Timestamps the document lacked are set to `now`. Returns a
    /// description of each change made.
    pub fn repair(&mut self, now: Time) -> Vec<String> {
        let mut changes = Vec::new();

        if self.started_at == unset_time() {
            self.started_at = now;
            changes.push("startedAt was missing, set to now".to_string());
        }
        if self.last_updated == unset_time() {
            self.last_updated = now;
            changes.push("lastUpdated was missing, set to now".to_string());
        }

        let unknown: Vec<ModuleId> = self
            .modules
            .keys()
            .filter(|id| catalog::module(**id).is_none())
            .copied()
            .collect();
        for id in unknown {
            self.modules.remove(&id);
            changes.push(format!("dropped unknown module {id}"));
        }
        self.quizzes.retain(|id, _| catalog::module(*id).is_some());

        for info in &catalog::MODULES {
            let module_id = ModuleId::new(info.id);
            let module = self.modules.entry(module_id).or_insert_with(|| {
                changes.push(format!("added missing module {module_id}"));
                ModuleProgress::new(info.lessons)
            });

            if module.total != u32::from(info.lessons) {
                changes.push(format!(
                    "module {module_id}: total {} restored to {}",
                    module.total, info.lessons
                ));
                module.total = u32::from(info.lessons);
            }

            let before = module.lessons.len();
            module
                .lessons
                .retain(|l, _| (1..=info.lessons).contains(&l.get()));
            if module.lessons.len() != before {
                changes.push(format!("module {module_id}: dropped unknown lessons"));
            }
            for lesson_id in catalog::lesson_ids(info) {
                module.lessons.entry(lesson_id).or_insert_with(|| {
                    changes.push(format!("module {module_id}: added missing lesson {lesson_id}"));
                    LessonState::default()
                });
            }

            let counted = module.count_completed();
            if module.completed != counted {
                changes.push(format!(
                    "module {module_id}: completed {} recomputed as {counted}",
                    module.completed
                ));
                module.completed = counted;
            }

            self.quizzes.entry(module_id).or_insert_with(|| {
                changes.push(format!("added missing quiz record {module_id}"));
                QuizRecord::default()
            });
        }

        let sum: u32 = self.modules.values().map(|m| m.completed).sum();
        if self.total_lessons_completed != sum {
            changes.push(format!(
                "totalLessonsCompleted {} recomputed as {sum}",
                self.total_lessons_completed
            ));
            self.total_lessons_completed = sum;
        }

        changes
    }
}
