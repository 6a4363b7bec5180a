//! Progress tracking
//!
//! The progress store, derived statistics and achievements, and the
//! presentation helpers that follow store updates.

#![warn(missing_docs)]

pub mod confirm;
pub mod store;
pub mod stats;
pub mod tracker;
pub mod summary;
pub mod theme;

pub use confirm::{Confirm, Preanswered};
pub use store::{
    ProgressError, ProgressStore, ProgressUpdate, Result, StoreConfig, UpdateReason,
    PROGRESS_KEY, RESET_PROMPT,
};
pub use stats::{achievements, Statistics};
pub use tracker::ProgressTracker;
pub use summary::{GlobalProgressBar, ModuleSummary, ProgressSummary};
pub use theme::{ThemeManager, THEME_KEY};
