//! Progress tracking seam used by quiz sessions.

use async_trait::async_trait;
use learnpath_core::{ModuleId, QuizRecord};
use learnpath_storage::Storage;

use crate::store::{ProgressStore, Result};

/// Something that records submitted quiz attempts.
///
/// Quiz sessions depend on this trait rather than on the concrete store, so a
/// session can be scored against any recorder.
#[async_trait]
pub trait ProgressTracker: Send {
    /// Record one attempt of a module quiz.
    async fn record_quiz_attempt(
        &mut self,
        module: ModuleId,
        score: u32,
        total: u32,
    ) -> Result<QuizRecord>;
}

#[async_trait]
impl<S: Storage> ProgressTracker for ProgressStore<S> {
    async fn record_quiz_attempt(
        &mut self,
        module: ModuleId,
        score: u32,
        total: u32,
    ) -> Result<QuizRecord> {
        ProgressStore::record_quiz_attempt(self, module, score, total).await
    }
}
