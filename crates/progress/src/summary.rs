//! Read-only progress views: the progress modal and the global progress bar.

use std::fmt;

use learnpath_core::{catalog, percentage, ModuleId, ProgressDocument, TOTAL_LESSONS};
use serde::Serialize;
use tokio::sync::watch;

use crate::store::ProgressUpdate;

/// One row of the module table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    /// Module number
    pub module: u8,
    /// Module title from the catalog
    pub title: &'static str,
    /// Completed lessons
    pub completed: u32,
    /// Lessons in the module
    pub total: u32,
    /// Rounded completion, 0 for an empty module
    pub percentage: u32,
}

/// Overall and per-module completion, as shown in the progress modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    /// Completed lessons, summed over modules
    pub completed_lessons: u32,
    /// Lessons in the course
    pub total_lessons: u32,
    /// Rounded overall completion
    pub overall_percentage: u32,
    /// Rows in course order
    pub modules: Vec<ModuleSummary>,
}

impl ProgressSummary {
    /// Summarize a document.
    pub fn from_document(doc: &ProgressDocument) -> Self {
        let modules: Vec<ModuleSummary> = catalog::MODULES
            .iter()
            .map(|info| {
                let (completed, total) = doc
                    .module(ModuleId::new(info.id))
                    .map(|m| (m.completed, m.total))
                    .unwrap_or((0, 0));
                ModuleSummary {
                    module: info.id,
                    title: info.title,
                    completed,
                    total,
                    percentage: percentage(completed, total),
                }
            })
            .collect();

        let completed_lessons = modules.iter().map(|m| m.completed).sum();
        Self {
            completed_lessons,
            total_lessons: TOTAL_LESSONS,
            overall_percentage: percentage(completed_lessons, TOTAL_LESSONS),
            modules,
        }
    }
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overall Progress")?;
        writeln!(f, "  {} {}%", bar(self.overall_percentage, 30), self.overall_percentage)?;
        writeln!(
            f,
            "  {} of {} lessons completed ({}%)",
            self.completed_lessons, self.total_lessons, self.overall_percentage
        )?;
        writeln!(f)?;
        writeln!(f, "Module Progress")?;
        for row in &self.modules {
            writeln!(
                f,
                "  Module {:>2} {} {:>3}%  {} of {} lessons  {}",
                row.module,
                bar(row.percentage, 20),
                row.percentage,
                row.completed,
                row.total,
                row.title
            )?;
        }
        Ok(())
    }
}

/// Text progress bar of `width` cells.
pub fn bar(percent: u32, width: usize) -> String {
    let filled = (percent.min(100) as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// The header's "N% Complete" indicator, fed by store updates.
pub struct GlobalProgressBar {
    updates: watch::Receiver<ProgressUpdate>,
}

impl GlobalProgressBar {
    /// Follow a store subscription.
    pub fn new(updates: watch::Receiver<ProgressUpdate>) -> Self {
        Self { updates }
    }

    /// Percentage of the latest published document.
    pub fn percentage(&self) -> u32 {
        ProgressSummary::from_document(&self.updates.borrow().document).overall_percentage
    }

    /// Label text.
    pub fn text(&self) -> String {
        format!("{}% Complete", self.percentage())
    }

    /// Wait for the next store update and return the new label.
    /// `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<String> {
        self.updates.changed().await.ok()?;
        Some(self.text())
    }
}
