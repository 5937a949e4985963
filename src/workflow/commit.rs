use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::CommitResult,
    },
    providers::backend::IntakeBackend,
    workflow::{busy::BusyState, editor::ReconciledSubmission, pending_store::PendingRowStore},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
}

/// One failed or skipped row. `index` is the position inside the submitted
/// save set as reported by the backend; `position` maps it back to the batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RowOutcome {
    pub index: usize,
    pub position: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub severity: Severity,
    pub saved_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub failures: Vec<RowOutcome>,
    pub skipped: Vec<RowOutcome>,
    pub excel: Option<String>,
    pub excel_errors: Vec<String>,
}

impl CommitSummary {
    pub fn from_result(result: &CommitResult, save_positions: &[usize]) -> Self {
        let position_of = |index: usize| save_positions.get(index).copied();
        let failures: Vec<RowOutcome> = result
            .failed
            .iter()
            .map(|failed| RowOutcome {
                index: failed.index,
                position: position_of(failed.index),
                reason: failed.error.clone(),
            })
            .collect();
        let skipped: Vec<RowOutcome> = result
            .skipped
            .iter()
            .map(|skipped| RowOutcome {
                index: skipped.index,
                position: position_of(skipped.index),
                reason: skipped
                    .reason
                    .clone()
                    .filter(|reason| !reason.is_empty())
                    .unwrap_or_else(|| "duplicate".to_string()),
            })
            .collect();

        let severity = if result.has_failures() {
            Severity::Warning
        } else if result.has_skips() {
            Severity::Info
        } else {
            Severity::Success
        };

        Self {
            severity,
            saved_count: result.saved_count,
            failed_count: result.failed_count.max(failures.len()),
            skipped_count: result.skipped_count.max(skipped.len()),
            failures,
            skipped,
            excel: result.excel_location(),
            excel_errors: result.excel_errors.clone(),
        }
    }

    pub fn title(&self) -> String {
        format!("Saved {} rows", self.saved_count)
    }

    pub fn is_partial(&self) -> bool {
        self.failed_count > 0 || self.skipped_count > 0
    }
}

impl fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title())?;
        if self.failed_count > 0 {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(f, "{}: {}", failure.index, failure.reason)?;
            }
        }
        if self.skipped_count > 0 {
            writeln!(f, "Skipped ({}):", self.skipped_count)?;
            for skipped in &self.skipped {
                writeln!(f, "{}: {}", skipped.index, skipped.reason)?;
            }
        }
        if let Some(excel) = &self.excel {
            writeln!(f, "Excel: {excel}")?;
        }
        Ok(())
    }
}

/// Sends a reconciled submission: save first, then best-effort cleanup of
/// denied rows' staged artifacts whatever the save outcome.
pub struct CommitCoordinator<'a, B: ?Sized> {
    backend: &'a B,
    store: &'a PendingRowStore,
    busy: &'a BusyState,
}

impl<'a, B> CommitCoordinator<'a, B>
where
    B: IntakeBackend + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a PendingRowStore, busy: &'a BusyState) -> Self {
        Self { backend, store, busy }
    }

    pub async fn submit(&self, submission: &ReconciledSubmission) -> AppResult<CommitSummary> {
        if submission.save_rows.is_empty() {
            return Err(AppError::NoRowsAllowed);
        }

        let _busy = self.busy.acquire("save");
        let saved = self.backend.save_rows(&submission.save_rows).await;
        let result = match saved {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, rows = submission.save_rows.len(), "save submission failed");
                self.discard_rejected(submission).await;
                return Err(err.into_submission());
            }
        };
        info!(
            saved = result.saved_count,
            failed = result.failed_count,
            skipped = result.skipped_count,
            "save submission accepted"
        );

        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "could not clear pending batch after save");
        }
        self.discard_rejected(submission).await;

        Ok(CommitSummary::from_result(&result, &submission.save_positions))
    }

    /// Best-effort cleanup of denied rows' staged artifacts. Failures are
    /// logged and never reach the caller.
    async fn discard_rejected(&self, submission: &ReconciledSubmission) {
        if submission.reject_files.is_empty() {
            return;
        }
        match self.backend.reject_rows(&submission.reject_files).await {
            Ok(()) => info!(files = submission.reject_files.len(), "rejected artifacts discarded"),
            Err(err) => warn!(
                error = %err,
                files = submission.reject_files.len(),
                "reject cleanup failed"
            ),
        }
    }
}
