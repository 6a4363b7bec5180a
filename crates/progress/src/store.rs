//! Progress store - owns the progress document and keeps storage in sync.

use chrono::NaiveDate;
use learnpath_core::{
    Achievement, Clock, LessonId, LessonState, LookupError, ModuleId, ModuleProgress,
    ProgressDocument, QuizRecord,
};
use learnpath_storage::{Storage, StorageError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::confirm::Confirm;
use crate::stats::{self, Statistics};

/// Default storage slot of the progress document.
pub const PROGRESS_KEY: &str = "python_learning_progress";

/// Prompt shown before a reset.
pub const RESET_PROMPT: &str =
    "Are you sure you want to reset all progress? This cannot be undone.";

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors reported by the progress store.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
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

    /// Import data failed the shape check
    #[error("invalid progress snapshot: {0}")]
    InvalidSnapshot(String),

    /// Storage backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LookupError> for ProgressError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::UnknownModule(module) => ProgressError::UnknownModule(module),
            LookupError::UnknownLesson { module, lesson } => {
                ProgressError::UnknownLesson { module, lesson }
            }
        }
    }
}

/// Configuration for the progress store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storage slot holding the document
    pub storage_key: String,
    /// Repair derived counters of loaded and imported documents
    pub repair_on_load: bool,
    /// Time source for timestamps
    pub clock: Clock,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: PROGRESS_KEY.to_string(),
            repair_on_load: true,
            clock: Clock::System,
        }
    }
}

/// What caused a published update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// Document read from storage
    Loaded,
    /// Fresh document created
    Initialized,
    /// Lesson marked complete
    LessonCompleted(ModuleId, LessonId),
    /// Lesson marked incomplete
    LessonReopened(ModuleId, LessonId),
    /// Quiz attempt recorded
    QuizRecorded(ModuleId),
    /// Progress reset by the user
    Reset,
    /// Snapshot imported
    Imported,
}

/// Notification carrying the full document after a change.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Cause of the update
    pub reason: UpdateReason,
    /// Document as persisted
    pub document: ProgressDocument,
}

/// The progress store.
///
/// Every mutation follows the same path: change the in-memory document, stamp
/// `lastUpdated`, write the whole document to storage, then publish it to
/// subscribers. Subscribers only ever see the latest document.
pub struct ProgressStore<S: Storage> {
    storage: S,
    config: StoreConfig,
    document: ProgressDocument,
    updates: watch::Sender<ProgressUpdate>,
}

impl<S: Storage> ProgressStore<S> {
    /// Open a store with the default configuration.
    pub async fn open(storage: S) -> Result<Self> {
        Self::open_with_config(storage, StoreConfig::default()).await
    }

    /// Open a store, loading or initializing the document.
    pub async fn open_with_config(storage: S, config: StoreConfig) -> Result<Self> {
        let document = ProgressDocument::new(config.clock.now());
        let (updates, _) = watch::channel(ProgressUpdate {
            reason: UpdateReason::Loaded,
            document: document.clone(),
        });

        let mut store = Self {
            storage,
            config,
            document,
            updates,
        };
        store.load().await?;
        Ok(store)
    }

    /// Current configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The in-memory document.
    pub fn document(&self) -> &ProgressDocument {
        &self.document
    }

    /// Re-read the document from storage, initializing it when absent.
    ///
    /// Unreadable content is kept under `<key>.corrupt` and replaced by a
    /// fresh document.
    pub async fn load(&mut self) -> Result<&ProgressDocument> {
        let key = self.config.storage_key.clone();

        let Some(raw) = self.storage.load_slot(&key).await? else {
            info!("No stored progress under {}, initializing", key);
            let fresh = ProgressDocument::new(self.config.clock.now());
            self.commit(fresh, UpdateReason::Initialized).await?;
            return Ok(&self.document);
        };

        match serde_json::from_str::<ProgressDocument>(&raw) {
            Ok(mut document) => {
                let changes = if self.config.repair_on_load {
                    document.repair(self.config.clock.now())
                } else {
                    Vec::new()
                };
                if changes.is_empty() {
                    debug!("Loaded progress from {}", key);
                    self.document = document;
                    self.publish(UpdateReason::Loaded);
                } else {
                    for change in &changes {
                        warn!("Repaired stored progress: {}", change);
                    }
                    self.commit(document, UpdateReason::Loaded).await?;
                }
            }
            Err(e) => {
                warn!("Stored progress under {} is unreadable ({}), starting over", key, e);
                let backup = format!("{}.corrupt", key);
                self.storage.save_slot(&backup, &raw).await?;
                let fresh = ProgressDocument::new(self.config.clock.now());
                self.commit(fresh, UpdateReason::Initialized).await?;
            }
        }

        Ok(&self.document)
    }

    /// Subscribe to document changes.
    pub fn subscribe(&self) -> watch::Receiver<ProgressUpdate> {
        self.updates.subscribe()
    }

    /// Mark a lesson complete. Returns whether it was newly completed.
    pub async fn mark_lesson_complete(&mut self, module: ModuleId, lesson: LessonId) -> Result<bool> {
        let now = self.config.clock.now();
        let mut next = self.document.clone();
        let newly = next
            .complete_lesson(module, lesson, now)
            .inspect_err(|e| warn!("Cannot complete lesson: {}", e))?;

        self.commit(next, UpdateReason::LessonCompleted(module, lesson)).await?;
        info!("Lesson {}.{} completed (new: {})", module, lesson, newly);
        Ok(newly)
    }

    /// Mark a lesson incomplete. Returns whether it was previously completed.
    pub async fn mark_lesson_incomplete(&mut self, module: ModuleId, lesson: LessonId) -> Result<bool> {
        let mut next = self.document.clone();
        let was_completed = next
            .uncomplete_lesson(module, lesson)
            .inspect_err(|e| warn!("Cannot reopen lesson: {}", e))?;

        self.commit(next, UpdateReason::LessonReopened(module, lesson)).await?;
        info!("Lesson {}.{} reopened (was completed: {})", module, lesson, was_completed);
        Ok(was_completed)
    }

    /// Record a quiz attempt and return the updated record.
    pub async fn record_quiz_attempt(
        &mut self,
        module: ModuleId,
        score: u32,
        total: u32,
    ) -> Result<QuizRecord> {
        let now = self.config.clock.now();
        let mut next = self.document.clone();
        let record = next
            .record_quiz_attempt(module, score, total, now)
            .inspect_err(|e| warn!("Cannot record quiz attempt: {}", e))?
            .clone();

        self.commit(next, UpdateReason::QuizRecorded(module)).await?;
        info!(
            "Quiz {} attempt {}: {}/{} (best {}%)",
            module, record.attempts, score, total, record.best_score
        );
        Ok(record)
    }

    /// Whether a lesson is complete. Unknown ids are not complete.
    pub fn is_lesson_complete(&self, module: ModuleId, lesson: LessonId) -> bool {
        self.document
            .lesson(module, lesson)
            .is_some_and(|l: &LessonState| l.completed)
    }

    /// Progress of one module.
    pub fn module_progress(&self, module: ModuleId) -> Option<&ModuleProgress> {
        self.document.module(module)
    }

    /// Whether all lessons of a module are complete.
    pub fn is_module_complete(&self, module: ModuleId) -> bool {
        self.document.module(module).is_some_and(ModuleProgress::is_complete)
    }

    /// Quiz record of one module.
    pub fn quiz_progress(&self, module: ModuleId) -> Option<&QuizRecord> {
        self.document.quiz(module)
    }

    /// Overall completion percentage.
    pub fn overall_percentage(&self) -> u32 {
        self.document.overall_percentage()
    }

    /// First incomplete lesson in course order, `None` when all are done.
    pub fn next_incomplete_lesson(&self) -> Option<(ModuleId, LessonId)> {
        self.document.next_incomplete_lesson()
    }

    /// Aggregate statistics.
    pub fn statistics(&self) -> Statistics {
        Statistics::from_document(&self.document, self.config.clock.now())
    }

    /// Unlocked achievements, derived fresh on every call.
    pub fn achievements(&self) -> Vec<Achievement> {
        stats::achievements(&self.document)
    }

    /// Replace the document with a fresh one after confirmation.
    /// Returns `false` when the user declined.
    pub async fn reset(&mut self, confirm: &dyn Confirm) -> Result<bool> {
        if !confirm.confirm(RESET_PROMPT) {
            debug!("Reset declined");
            return Ok(false);
        }

        let fresh = ProgressDocument::new(self.config.clock.now());
        self.commit(fresh, UpdateReason::Reset).await?;
        info!("Progress reset");
        Ok(true)
    }

    /// Serialize the document for download.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.document)?)
    }

    /// File name for an export made on `date`.
    pub fn export_file_name(date: NaiveDate) -> String {
        format!("python-learning-progress-{}.json", date.format("%Y-%m-%d"))
    }

    /// Replace the document with an exported snapshot.
    ///
    /// The snapshot must be a JSON object with `version` and `modules`.
    pub async fn import_snapshot(&mut self, data: &[u8]) -> Result<()> {
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ProgressError::InvalidSnapshot(e.to_string()))?;

        let has_shape = value.get("version").is_some() && value.get("modules").is_some();
        if !has_shape {
            warn!("Rejected progress import without version/modules");
            return Err(ProgressError::InvalidSnapshot(
                "missing `version` or `modules`".to_string(),
            ));
        }

        let mut document: ProgressDocument = serde_json::from_value(value)
            .map_err(|e| ProgressError::InvalidSnapshot(e.to_string()))?;
        if self.config.repair_on_load {
            for change in document.repair(self.config.clock.now()) {
                warn!("Repaired imported progress: {}", change);
            }
        }

        self.commit(document, UpdateReason::Imported).await?;
        info!("Progress imported");
        Ok(())
    }

    /// Stamp and save `document`, then make it current and publish it.
    /// On a failed save the current document stays as it was.
    async fn commit(&mut self, mut document: ProgressDocument, reason: UpdateReason) -> Result<()> {
        document.last_updated = self.config.clock.now();
        let json = serde_json::to_string(&document)?;
        self.storage
            .save_slot(&self.config.storage_key, &json)
            .await
            .inspect_err(|e| warn!("Progress not saved, keeping previous state: {}", e))?;
        self.document = document;
        self.publish(reason);
        Ok(())
    }

    fn publish(&self, reason: UpdateReason) {
        self.updates.send_replace(ProgressUpdate {
            reason,
            document: self.document.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::Preanswered;
    use learnpath_core::time::fixed_now;
    use learnpath_core::{MODULE_COUNT, TOTAL_LESSONS};
    use async_trait::async_trait;
    use learnpath_storage::MemoryStorage;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn m(id: u8) -> ModuleId {
        ModuleId::new(id)
    }

    fn l(id: u8) -> LessonId {
        LessonId::new(id)
    }

    fn fixed_config() -> StoreConfig {
        StoreConfig {
            clock: Clock::fixed(fixed_now()),
            ..StoreConfig::default()
        }
    }

    async fn open_store() -> (ProgressStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = ProgressStore::open_with_config(storage.clone(), fixed_config())
            .await
            .unwrap();
        (store, storage)
    }

    async fn stored_document(storage: &MemoryStorage) -> ProgressDocument {
        let raw = storage.load_slot(PROGRESS_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn assert_counters(doc: &ProgressDocument) {
        for module in doc.modules.values() {
            let counted = module.lessons.values().filter(|l| l.completed).count() as u32;
            assert_eq!(module.completed, counted);
        }
        let sum: u32 = doc.modules.values().map(|m| m.completed).sum();
        assert_eq!(doc.total_lessons_completed, sum);
    }

    #[tokio::test]
    async fn test_open_initializes_and_persists() {
        let (store, storage) = open_store().await;

        assert_eq!(store.document().modules.len(), usize::from(MODULE_COUNT));
        assert_eq!(stored_document(&storage).await, *store.document());
    }

    #[tokio::test]
    async fn test_counters_hold_after_every_toggle() {
        let (mut store, storage) = open_store().await;
        let ops: [(bool, u8, u8); 9] = [
            (true, 1, 1),
            (true, 1, 1),
            (true, 1, 2),
            (false, 1, 1),
            (false, 1, 1),
            (true, 9, 6),
            (false, 3, 4),
            (true, 3, 4),
            (true, 14, 5),
        ];

        for (complete, module, lesson) in ops {
            if complete {
                store.mark_lesson_complete(m(module), l(lesson)).await.unwrap();
            } else {
                store.mark_lesson_incomplete(m(module), l(lesson)).await.unwrap();
            }
            assert_counters(store.document());
            assert_counters(&stored_document(&storage).await);
        }

        assert_eq!(store.document().total_lessons_completed, 4);
        assert_eq!(store.document().lesson(m(1), l(1)).unwrap().attempts, 2);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_reported() {
        let (mut store, _) = open_store().await;

        let err = store.mark_lesson_complete(m(15), l(1)).await.unwrap_err();
        assert!(matches!(err, ProgressError::UnknownModule(id) if id == m(15)));

        let err = store.mark_lesson_incomplete(m(1), l(9)).await.unwrap_err();
        assert!(matches!(err, ProgressError::UnknownLesson { .. }));

        let err = store.record_quiz_attempt(m(0), 1, 2).await.unwrap_err();
        assert!(matches!(err, ProgressError::UnknownModule(_)));
    }

    #[tokio::test]
    async fn test_overall_percentage_37_of_73() {
        let (mut store, _) = open_store().await;
        let mut marked = 0;
        'outer: for info in learnpath_core::catalog::MODULES.iter() {
            for lesson in 1..=info.lessons {
                if marked == 37 {
                    break 'outer;
                }
                store.mark_lesson_complete(m(info.id), l(lesson)).await.unwrap();
                marked += 1;
            }
        }

        assert_eq!(store.document().total_lessons_completed, 37);
        assert_eq!(store.overall_percentage(), 51);
        assert_eq!(TOTAL_LESSONS, 73);
    }

    #[tokio::test]
    async fn test_quiz_best_score_never_drops() {
        let (mut store, _) = open_store().await;

        let first = store.record_quiz_attempt(m(3), 7, 10).await.unwrap();
        assert_eq!(first.best_score, 70);
        assert!(first.completed);

        let second = store.record_quiz_attempt(m(3), 5, 10).await.unwrap();
        assert_eq!(second.best_score, 70);
        assert!(second.completed);
        assert_eq!(second.attempts, 2);
        assert_eq!(store.quiz_progress(m(3)).unwrap().last_attempt.as_ref().unwrap().percentage, 50);
    }

    #[tokio::test]
    async fn test_next_incomplete_lesson() {
        let (mut store, _) = open_store().await;
        for lesson in 1..=5 {
            store.mark_lesson_complete(m(1), l(lesson)).await.unwrap();
        }

        assert!(store.is_module_complete(m(1)));
        assert_eq!(store.next_incomplete_lesson(), Some((m(2), l(1))));
    }

    #[tokio::test]
    async fn test_next_incomplete_lesson_none_when_done() {
        let (mut store, _) = open_store().await;
        for info in learnpath_core::catalog::MODULES.iter() {
            for lesson in 1..=info.lessons {
                store.mark_lesson_complete(m(info.id), l(lesson)).await.unwrap();
            }
        }

        assert_eq!(store.next_incomplete_lesson(), None);
        assert_eq!(store.overall_percentage(), 100);
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let (mut store, storage) = open_store().await;
        store.mark_lesson_complete(m(2), l(2)).await.unwrap();

        assert!(!store.reset(&Preanswered(false)).await.unwrap());
        assert!(store.is_lesson_complete(m(2), l(2)));

        let asked = std::cell::Cell::new(false);
        let confirm = |message: &str| {
            asked.set(message == RESET_PROMPT);
            true
        };
        assert!(store.reset(&confirm).await.unwrap());
        assert!(asked.get());
        assert!(!store.is_lesson_complete(m(2), l(2)));
        assert_eq!(stored_document(&storage).await.total_lessons_completed, 0);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let (mut store, _) = open_store().await;
        store.mark_lesson_complete(m(5), l(3)).await.unwrap();
        store.record_quiz_attempt(m(5), 4, 5).await.unwrap();
        let before = store.document().clone();

        let bytes = store.export_snapshot().unwrap();
        store.import_snapshot(&bytes).await.unwrap();

        let mut after = store.document().clone();
        after.last_updated = before.last_updated;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_shape() {
        let (mut store, _) = open_store().await;
        store.mark_lesson_complete(m(1), l(1)).await.unwrap();

        let cases: [&[u8]; 4] = [
            b"{\"modules\":{}}",
            b"{\"version\":\"1.0.0\"}",
            b"[]",
            b"not json",
        ];
        for data in cases {
            let err = store.import_snapshot(data).await.unwrap_err();
            assert!(matches!(err, ProgressError::InvalidSnapshot(_)));
        }
        assert!(store.is_lesson_complete(m(1), l(1)));
    }

    #[tokio::test]
    async fn test_import_repairs_counts() {
        let (mut store, _) = open_store().await;
        let mut doc = ProgressDocument::new(fixed_now());
        doc.complete_lesson(m(2), l(3), fixed_now()).unwrap();
        doc.total_lessons_completed = 12;
        doc.modules.remove(&m(10));

        store.import_snapshot(&serde_json::to_vec(&doc).unwrap()).await.unwrap();

        assert_counters(store.document());
        assert_eq!(store.document().total_lessons_completed, 1);
        assert!(store.module_progress(m(10)).is_some());
    }

    #[tokio::test]
    async fn test_corrupt_storage_is_backed_up() {
        let storage = MemoryStorage::with_slot(PROGRESS_KEY, "{broken");
        let store = ProgressStore::open_with_config(storage.clone(), fixed_config())
            .await
            .unwrap();

        assert_eq!(store.document().total_lessons_completed, 0);
        let backup = format!("{}.corrupt", PROGRESS_KEY);
        assert_eq!(storage.load_slot(&backup).await.unwrap().as_deref(), Some("{broken"));
    }

    #[tokio::test]
    async fn test_subscribers_see_latest_document() {
        let (mut store, _) = open_store().await;
        let mut rx = store.subscribe();
        let mut late = store.subscribe();

        store.mark_lesson_complete(m(1), l(1)).await.unwrap();
        store.mark_lesson_complete(m(1), l(2)).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let update = rx.borrow_and_update().clone();
        assert_eq!(update.reason, UpdateReason::LessonCompleted(m(1), l(2)));
        assert_eq!(update.document.total_lessons_completed, 2);
        assert!(!rx.has_changed().unwrap());

        assert_eq!(late.borrow_and_update().document.total_lessons_completed, 2);
    }

    #[tokio::test]
    async fn test_import_sparse_snapshot() {
        let (mut store, storage) = open_store().await;
        let data = br#"{"version":"1.0.0","modules":{"1":{"lessons":{"1":{"completed":true}}}}}"#;

        store.import_snapshot(data).await.unwrap();

        assert_counters(store.document());
        assert_eq!(store.document().total_lessons_completed, 1);
        assert!(store.is_lesson_complete(m(1), l(1)));
        assert_eq!(store.module_progress(m(1)).unwrap().total, 5);
        assert!(store.quiz_progress(m(3)).is_some());
        assert_eq!(store.document().started_at, fixed_now());
        assert_eq!(stored_document(&storage).await, *store.document());
    }

    #[tokio::test]
    async fn test_sparse_stored_document_loads_without_backup() {
        let raw = r#"{"version":"1.0.0","modules":{"2":{"lessons":{"3":{"completed":true}}}}}"#;
        let storage = MemoryStorage::with_slot(PROGRESS_KEY, raw);
        let store = ProgressStore::open_with_config(storage.clone(), fixed_config())
            .await
            .unwrap();

        assert!(store.is_lesson_complete(m(2), l(3)));
        assert_eq!(store.document().total_lessons_completed, 1);
        assert_counters(&stored_document(&storage).await);
        let backup = format!("{}.corrupt", PROGRESS_KEY);
        assert_eq!(storage.load_slot(&backup).await.unwrap(), None);
    }

    /// Memory storage whose writes can be made to fail.
    #[derive(Clone, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn load_slot(&self, key: &str) -> learnpath_storage::Result<Option<String>> {
            self.inner.load_slot(key).await
        }

        async fn save_slot(&mut self, key: &str, value: &str) -> learnpath_storage::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Other("disk full".to_string()));
            }
            self.inner.save_slot(key, value).await
        }

        async fn remove_slot(&mut self, key: &str) -> learnpath_storage::Result<()> {
            self.inner.remove_slot(key).await
        }

        async fn list_slots(&self) -> learnpath_storage::Result<Vec<String>> {
            self.inner.list_slots().await
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_state() {
        let storage = FlakyStorage::default();
        let mut store = ProgressStore::open_with_config(storage.clone(), fixed_config())
            .await
            .unwrap();
        store.mark_lesson_complete(m(4), l(1)).await.unwrap();
        let before = store.document().clone();
        let rx = store.subscribe();

        storage.fail_writes.store(true, Ordering::SeqCst);

        let err = store.mark_lesson_complete(m(1), l(1)).await.unwrap_err();
        assert!(matches!(err, ProgressError::Storage(StorageError::Other(_))));
        assert!(!store.is_lesson_complete(m(1), l(1)));
        assert_eq!(store.document().total_lessons_completed, 1);

        assert!(store.mark_lesson_incomplete(m(4), l(1)).await.is_err());
        assert!(store.record_quiz_attempt(m(4), 3, 4).await.is_err());
        assert!(store.reset(&Preanswered(true)).await.is_err());
        let fresh = serde_json::to_vec(&ProgressDocument::new(fixed_now())).unwrap();
        assert!(store.import_snapshot(&fresh).await.is_err());

        assert_eq!(*store.document(), before);
        assert_eq!(stored_document(&storage.inner).await, before);
        assert!(!rx.has_changed().unwrap());

        storage.fail_writes.store(false, Ordering::SeqCst);
        assert!(store.mark_lesson_complete(m(1), l(1)).await.unwrap());
        assert_eq!(stored_document(&storage.inner).await.total_lessons_completed, 2);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            ProgressStore::<MemoryStorage>::export_file_name(date),
            "python-learning-progress-2024-03-09.json"
        );
    }
}
