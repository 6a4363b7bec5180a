//! Quiz session - one attempt at a module quiz.

use std::collections::BTreeMap;
use std::sync::Arc;

use learnpath_core::{percentage, ModuleId, QuestionId, QuizDefinition, QuizRecord};
use learnpath_progress::{Confirm, ProgressTracker};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{QuizError, Result};
use crate::feedback::Feedback;
use crate::review::QuestionReview;

/// Prompt shown before starting over.
pub const RETAKE_PROMPT: &str =
    "Are you sure you want to retake the quiz? Your current score will be saved, but you'll start fresh.";

/// Prompt shown when submitting with unanswered questions.
pub fn unanswered_prompt(unanswered: usize) -> String {
    format!("You have {} unanswered question(s). Submit anyway?", unanswered)
}

/// Scored result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    /// Correct answers
    pub score: u32,
    /// Questions in the quiz
    pub total: u32,
    /// Rounded percentage
    pub percentage: u32,
    /// Performance tier
    pub feedback: Feedback,
    /// The module's quiz record after this attempt
    pub record: QuizRecord,
}

impl QuizResult {
    /// Questions answered wrong or left blank.
    pub fn incorrect(&self) -> u32 {
        self.total - self.score
    }
}

/// What `submit` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Scored and recorded
    Submitted(QuizResult),
    /// The learner declined to submit with unanswered questions
    Cancelled,
}

/// Snapshot numbers of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatistics {
    /// Questions in the quiz
    pub total_questions: usize,
    /// Questions with a stored answer
    pub answered_questions: usize,
    /// Correct answers, 0 until submitted
    pub score: u32,
    /// Rounded score percentage
    pub percentage: u32,
    /// Whether the session was submitted
    pub submitted: bool,
}

/// Position indicator: "Question 2 of 5".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    /// 1-based question number
    pub current: usize,
    /// Questions in the quiz
    pub total: usize,
    /// How far through the quiz the current question is
    pub percentage: u32,
}

/// Transient state of one quiz attempt.
///
/// A session moves from in-progress to submitted exactly once. Starting over
/// means a new session from [`QuizSession::retake`]; recorded progress is
/// never touched by anything but `submit`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    module: ModuleId,
    quiz: Arc<QuizDefinition>,
    current_index: usize,
    answers: BTreeMap<QuestionId, String>,
    score: u32,
    submitted: bool,
}

impl QuizSession {
    /// Start a session. Rejects quizzes without questions.
    pub fn new(module: ModuleId, quiz: impl Into<Arc<QuizDefinition>>) -> Result<Self> {
        let quiz = quiz.into();
        if quiz.questions.is_empty() {
            warn!("Quiz for module {} has no questions", module);
            return Err(QuizError::EmptyQuiz);
        }

        debug!("Quiz session for module {}: {} questions", module, quiz.questions.len());
        Ok(Self {
            module,
            quiz,
            current_index: 0,
            answers: BTreeMap::new(),
            score: 0,
            submitted: false,
        })
    }

    /// Module the quiz belongs to.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// The quiz being taken.
    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    /// 0-based index of the question on screen.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Stored answers by question.
    pub fn answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.answers
    }

    /// Stored answer of one question.
    pub fn answer(&self, id: QuestionId) -> Option<&str> {
        self.answers.get(&id).map(String::as_str)
    }

    /// Score of the submission, 0 before it.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether the session reached its terminal state.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    fn total(&self) -> usize {
        self.quiz.questions.len()
    }

    /// Move to the question after `from`. Returns whether it moved.
    pub fn advance(&mut self, from: usize) -> bool {
        match from.checked_add(1) {
            Some(target) if target < self.total() => {
                self.current_index = target;
                true
            }
            _ => false,
        }
    }

    /// Move to the question before `from`. Returns whether it moved.
    pub fn retreat(&mut self, from: usize) -> bool {
        match from.checked_sub(1) {
            Some(target) if target < self.total() => {
                self.current_index = target;
                true
            }
            _ => false,
        }
    }

    /// Store an answer; a later answer replaces an earlier one.
    pub fn record_answer(&mut self, id: QuestionId, value: impl Into<String>) -> Result<()> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        if self.quiz.question(id).is_none() {
            warn!("Answer for unknown question {} in module {} quiz", id, self.module);
            return Err(QuizError::UnknownQuestion(id));
        }

        self.answers.insert(id, value.into());
        Ok(())
    }

    /// Questions without an answer.
    pub fn unanswered(&self) -> usize {
        self.total() - self.answers.len()
    }

    /// Score the session and record the attempt.
    ///
    /// With unanswered questions the learner is asked first; declining leaves
    /// the session in progress.
    pub async fn submit<T>(&mut self, tracker: &mut T, confirm: &dyn Confirm) -> Result<SubmitOutcome>
    where
        T: ProgressTracker + ?Sized,
    {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }

        let unanswered = self.unanswered();
        if unanswered > 0 && !confirm.confirm(&unanswered_prompt(unanswered)) {
            debug!("Submission with {} unanswered declined", unanswered);
            return Ok(SubmitOutcome::Cancelled);
        }

        self.finish(tracker).await.map(SubmitOutcome::Submitted)
    }

    /// Submit without asking, as when the timer runs out.
    pub async fn auto_submit<T>(&mut self, tracker: &mut T) -> Result<QuizResult>
    where
        T: ProgressTracker + ?Sized,
    {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        info!("Time is up, submitting module {} quiz", self.module);
        self.finish(tracker).await
    }

    async fn finish<T>(&mut self, tracker: &mut T) -> Result<QuizResult>
    where
        T: ProgressTracker + ?Sized,
    {
        let score = self.count_correct();
        let total = self.total() as u32;

        let record = tracker.record_quiz_attempt(self.module, score, total).await?;
        self.score = score;
        self.submitted = true;

        let pct = percentage(score, total);
        info!("Module {} quiz submitted: {}/{} ({}%)", self.module, score, total, pct);
        Ok(QuizResult {
            score,
            total,
            percentage: pct,
            feedback: Feedback::from_percentage(pct),
            record,
        })
    }

    fn count_correct(&self) -> u32 {
        self.quiz
            .question_ids()
            .zip(&self.quiz.questions)
            .filter(|(id, question)| {
                self.answer(*id).is_some_and(|answer| question.is_correct(answer))
            })
            .count() as u32
    }

    /// Per-question review with option marks and explanations.
    pub fn review_answers(&self) -> Vec<QuestionReview> {
        self.quiz
            .question_ids()
            .zip(&self.quiz.questions)
            .map(|(id, question)| QuestionReview::new(id, question, self.answer(id)))
            .collect()
    }

    /// A fresh session for the same quiz, if the learner confirms.
    pub fn retake(&self, confirm: &dyn Confirm) -> Option<QuizSession> {
        if !confirm.confirm(RETAKE_PROMPT) {
            return None;
        }
        debug!("Retaking module {} quiz", self.module);
        Some(Self {
            module: self.module,
            quiz: Arc::clone(&self.quiz),
            current_index: 0,
            answers: BTreeMap::new(),
            score: 0,
            submitted: false,
        })
    }

    /// Current numbers of the session.
    pub fn statistics(&self) -> QuizStatistics {
        let total = self.total();
        QuizStatistics {
            total_questions: total,
            answered_questions: self.answers.len(),
            score: self.score,
            percentage: percentage(self.score, total as u32),
            submitted: self.submitted,
        }
    }

    /// Position of the current question.
    pub fn progress(&self) -> QuizProgress {
        let current = self.current_index + 1;
        QuizProgress {
            current,
            total: self.total(),
            percentage: percentage(current as u32, self.total() as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{OptionMark, ReviewStatus};
    use async_trait::async_trait;
    use learnpath_core::time::fixed_now;
    use learnpath_core::{Question, QuestionType};
    use learnpath_progress::{Preanswered, ProgressStore, StoreConfig};
    use learnpath_storage::MemoryStorage;

    #[derive(Default)]
    struct RecordingTracker {
        calls: Vec<(ModuleId, u32, u32)>,
    }

    #[async_trait]
    impl ProgressTracker for RecordingTracker {
        async fn record_quiz_attempt(
            &mut self,
            module: ModuleId,
            score: u32,
            total: u32,
        ) -> learnpath_progress::Result<QuizRecord> {
            self.calls.push((module, score, total));
            let mut record = QuizRecord::default();
            record.record(score, total, fixed_now());
            Ok(record)
        }
    }

    fn choice(correct: u32) -> Question {
        Question {
            question: format!("Pick {}", correct),
            kind: QuestionType::MultipleChoice,
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: serde_json::json!(correct),
            explanation: Some("Because.".into()),
            code: None,
        }
    }

    fn five_questions() -> QuizDefinition {
        QuizDefinition {
            title: "Module 3 Quiz".into(),
            description: None,
            estimated_time: None,
            passing_score: Some(70),
            time_limit: None,
            questions: (0..5).map(|i| choice(i % 3)).collect(),
        }
    }

    fn q(n: usize) -> QuestionId {
        QuestionId::new(n)
    }

    fn module() -> ModuleId {
        ModuleId::new(3)
    }

    #[test]
    fn test_empty_quiz_is_rejected() {
        let mut quiz = five_questions();
        quiz.questions.clear();
        assert!(matches!(QuizSession::new(module(), quiz), Err(QuizError::EmptyQuiz)));
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut session = QuizSession::new(module(), five_questions()).unwrap();

        assert!(!session.retreat(0));
        assert!(session.advance(0));
        assert!(session.advance(1));
        assert_eq!(session.current_index(), 2);
        assert!(session.retreat(2));
        assert_eq!(session.current_index(), 1);
        assert!(!session.advance(4));
        assert!(!session.advance(usize::MAX));
        assert_eq!(session.current_index(), 1);
        assert!(session.answers().is_empty());

        let progress = session.progress();
        assert_eq!((progress.current, progress.total, progress.percentage), (2, 5, 40));
    }

    #[test]
    fn test_last_answer_wins() {
        let mut session = QuizSession::new(module(), five_questions()).unwrap();
        session.record_answer(q(1), "2").unwrap();
        session.record_answer(q(1), "0").unwrap();

        assert_eq!(session.answer(q(1)), Some("0"));
        assert!(matches!(
            session.record_answer(q(6), "0"),
            Err(QuizError::UnknownQuestion(id)) if id == q(6)
        ));
        assert!(matches!(session.record_answer(q(0), "0"), Err(QuizError::UnknownQuestion(_))));
    }

    #[tokio::test]
    async fn test_three_of_five_records_once() {
        let mut session = QuizSession::new(module(), five_questions()).unwrap();
        // Answer keys are 0, 1, 2, 0, 1.
        for (n, answer) in [(1, "0"), (2, "1"), (3, "2"), (4, "2"), (5, "2")] {
            session.record_answer(q(n), answer).unwrap();
        }

        let mut tracker = RecordingTracker::default();
        let outcome = session.submit(&mut tracker, &Preanswered(false)).await.unwrap();

        let SubmitOutcome::Submitted(result) = outcome else {
            panic!("expected a submission");
        };
        assert_eq!(result.score, 3);
        assert_eq!(result.percentage, 60);
        assert_eq!(result.incorrect(), 2);
        assert_eq!(result.feedback, Feedback::NotBad);
        assert_eq!(tracker.calls, vec![(module(), 3, 5)]);

        let stats = session.statistics();
        assert_eq!(stats.score, 3);
        assert_eq!(stats.percentage, 60);
        assert!(stats.submitted);
    }

    #[tokio::test]
    async fn test_unanswered_needs_confirmation() {
        let mut session = QuizSession::new(module(), five_questions()).unwrap();
        session.record_answer(q(1), "0").unwrap();
        let mut tracker = RecordingTracker::default();

        let asked = std::cell::RefCell::new(String::new());
        let decline = |message: &str| {
            *asked.borrow_mut() = message.to_string();
            false
        };
        let outcome = session.submit(&mut tracker, &decline).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Cancelled);
        assert_eq!(*asked.borrow(), "You have 4 unanswered question(s). Submit anyway?");
        assert!(!session.is_submitted());
        assert!(tracker.calls.is_empty());

        let outcome = session.submit(&mut tracker, &Preanswered(true)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(ref r) if r.score == 1));
        assert_eq!(tracker.calls.len(), 1);
    }

    #[tokio::test]
    async fn test_submitted_is_terminal() {
        let mut session = QuizSession::new(module(), five_questions()).unwrap();
        let mut tracker = RecordingTracker::default();
        let result = session.auto_submit(&mut tracker).await.unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback, Feedback::KeepTrying);

        assert!(matches!(
            session.submit(&mut tracker, &Preanswered(true)).await,
            Err(QuizError::AlreadySubmitted)
        ));
        assert!(matches!(session.record_answer(q(1), "0"), Err(QuizError::AlreadySubmitted)));
        assert_eq!(tracker.calls.len(), 1);
    }

    #[tokio::test]
    async fn test_review_marks() {
        let mut session = QuizSession::new(module(), five_questions()).unwrap();
        session.record_answer(q(1), "0").unwrap();
        session.record_answer(q(2), "2").unwrap();
        session.auto_submit(&mut RecordingTracker::default()).await.unwrap();

        let review = session.review_answers();
        assert_eq!(review.len(), 5);
        assert_eq!(review[0].status, ReviewStatus::Correct);
        assert_eq!(review[1].status, ReviewStatus::IncorrectSelected);
        assert_eq!(review[2].status, ReviewStatus::Unselected);

        let marks: Vec<OptionMark> = review[1].options.iter().map(|o| o.mark).collect();
        assert_eq!(marks, vec![OptionMark::Unmarked, OptionMark::Correct, OptionMark::Incorrect]);
        assert_eq!(review[1].options[2].label, "c");
        assert_eq!(review[1].explanation.as_deref(), Some("Because."));
    }

    #[tokio::test]
    async fn test_retake_starts_fresh_and_keeps_progress() {
        let config = StoreConfig {
            clock: learnpath_core::Clock::fixed(fixed_now()),
            ..StoreConfig::default()
        };
        let mut store = ProgressStore::open_with_config(MemoryStorage::new(), config)
            .await
            .unwrap();

        let mut session = QuizSession::new(module(), five_questions()).unwrap();
        for n in 1..=5 {
            let key = session.quiz().questions[n - 1].answer_key();
            session.record_answer(q(n), key).unwrap();
        }
        session.submit(&mut store, &Preanswered(true)).await.unwrap();
        assert_eq!(store.quiz_progress(module()).unwrap().best_score, 100);

        assert!(session.retake(&Preanswered(false)).is_none());
        let fresh = session.retake(&Preanswered(true)).unwrap();
        assert!(!fresh.is_submitted());
        assert!(fresh.answers().is_empty());
        assert_eq!(fresh.current_index(), 0);
        assert_eq!(store.quiz_progress(module()).unwrap().attempts, 1);
    }
}
