use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    core::{
        errors::{AppError, AppResult},
        fields::LogicalField,
        types::{Decision, PendingBatch, PendingBatchView},
    },
    providers::backend::IntakeBackend,
    workflow::{
        busy::BusyState,
        commit::{CommitCoordinator, CommitSummary},
        decisions::DecisionTracker,
        editor::VerificationEditor,
        pending_store::PendingRowStore,
    },
};

/// `Loaded → Editing → Submitting → Completed | SubmissionFailed`.
/// `SubmissionFailed` behaves like `Editing`: the batch is intact and the next
/// change or submit picks up from there. `Cleared` follows an explicit clear.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Loaded,
    Editing,
    Submitting,
    Completed,
    SubmissionFailed,
    Cleared,
}

/// One verification pass over a pending batch: decisions, edits and the
/// final commit. Owned by whoever drives the verification view.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    batch: PendingBatch,
    decisions: DecisionTracker,
    editor: VerificationEditor,
    phase: SessionPhase,
    last_error: Option<String>,
}

impl VerificationSession {
    pub fn start(batch: PendingBatch) -> Self {
        let decisions = DecisionTracker::new(batch.len());
        let editor = VerificationEditor::new(&batch);
        Self {
            batch,
            decisions,
            editor,
            phase: SessionPhase::Loaded,
            last_error: None,
        }
    }

    /// Picks up the batch staged by the last upload.
    pub async fn resume(store: &PendingRowStore) -> AppResult<Self> {
        match store.load().await? {
            Some(batch) if !batch.is_empty() => Ok(Self::start(batch)),
            _ => Err(AppError::NoPendingBatch),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn batch(&self) -> &PendingBatch {
        &self.batch
    }

    pub fn decisions(&self) -> &DecisionTracker {
        &self.decisions
    }

    pub fn editor(&self) -> &VerificationEditor {
        &self.editor
    }

    fn ensure_open(&self) -> AppResult<()> {
        match self.phase {
            SessionPhase::Completed | SessionPhase::Cleared => Err(AppError::NoPendingBatch),
            _ => Ok(()),
        }
    }

    fn begin_edit(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.phase = SessionPhase::Editing;
        Ok(())
    }

    /// Returns `false` when `index` is outside the batch; the call is then a no-op.
    pub fn decide(&mut self, index: usize, value: Decision) -> AppResult<bool> {
        self.begin_edit()?;
        Ok(self.decisions.set(index, value))
    }

    pub fn decide_all(&mut self, value: Decision) -> AppResult<()> {
        self.begin_edit()?;
        self.decisions.bulk_set(value);
        Ok(())
    }

    pub fn edit(&mut self, index: usize, field: LogicalField, value: impl Into<String>) -> AppResult<bool> {
        self.begin_edit()?;
        Ok(self.editor.set_value(index, field, value))
    }

    /// Submits allowed rows (with edits) and discards denied rows' artifacts.
    /// Refused without any network call when nothing is allowed.
    pub async fn commit<B>(
        &mut self,
        backend: &B,
        store: &PendingRowStore,
        busy: &BusyState,
    ) -> AppResult<CommitSummary>
    where
        B: IntakeBackend + ?Sized,
    {
        self.ensure_open()?;
        let submission = self.editor.reconcile(&self.decisions)?;
        if submission.save_rows.is_empty() {
            warn!(rows = self.batch.len(), "submit refused: no rows allowed");
            return Err(AppError::NoRowsAllowed);
        }

        self.phase = SessionPhase::Submitting;
        match CommitCoordinator::new(backend, store, busy).submit(&submission).await {
            Ok(summary) => {
                info!(saved = summary.saved_count, "verification session completed");
                self.phase = SessionPhase::Completed;
                self.last_error = None;
                Ok(summary)
            }
            Err(err) => {
                self.phase = SessionPhase::SubmissionFailed;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Drops the staged batch; the session cannot be submitted afterwards.
    pub async fn clear(&mut self, store: &PendingRowStore) -> AppResult<bool> {
        let removed = store.clear().await?;
        self.phase = SessionPhase::Cleared;
        Ok(removed)
    }

    pub fn view(&self, session: &str) -> PendingBatchView {
        PendingBatchView {
            session: session.to_string(),
            files: self.batch.files.clone(),
            rows: self.editor.row_views(&self.decisions),
            allowed: self.decisions.allowed_count(),
        }
    }
}
