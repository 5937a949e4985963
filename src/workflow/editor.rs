use serde_json::Value;
use tracing::warn;

use crate::{
    core::{
        errors::{AppError, AppResult},
        fields::{resolve_field, row_label, LogicalField},
        types::{Decision, ExtractedRow, PendingBatch, PendingRowView},
    },
    workflow::decisions::DecisionTracker,
};

#[derive(Debug, Clone)]
struct EditableRow {
    original: ExtractedRow,
    /// One live value per entry of `LogicalField::ALL`.
    values: Vec<String>,
}

impl EditableRow {
    fn new(original: ExtractedRow) -> Self {
        let values = LogicalField::ALL
            .iter()
            .map(|field| resolve_field(&original, *field))
            .collect();
        Self { original, values }
    }

    fn slot(field: LogicalField) -> usize {
        LogicalField::ALL
            .iter()
            .position(|candidate| *candidate == field)
            .unwrap_or(0)
    }

    /// The original row with every logical field overwritten by its live value.
    /// An edited field is also written to each alias key the row already has,
    /// so no reader falls back to the extracted value. Unrelated keys,
    /// `pending_file` included, pass through untouched.
    fn reconciled(&self) -> ExtractedRow {
        let mut row = self.original.clone();
        for (field, value) in LogicalField::ALL.iter().zip(&self.values) {
            if *value != resolve_field(&self.original, *field) {
                for alias in field.aliases() {
                    if self.original.raw(alias).is_some() {
                        row.set_text(*alias, value.clone());
                    }
                }
            }
            row.set_text(field.name(), value.clone());
        }
        row
    }
}

/// What a submit sends: edited rows to save and staged artifacts to discard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledSubmission {
    pub save_rows: Vec<ExtractedRow>,
    /// Batch position of each entry in `save_rows`.
    pub save_positions: Vec<usize>,
    pub reject_files: Vec<Value>,
}

/// Editable field values for every row of a pending batch.
#[derive(Debug, Clone)]
pub struct VerificationEditor {
    rows: Vec<EditableRow>,
}

impl VerificationEditor {
    pub fn new(batch: &PendingBatch) -> Self {
        Self {
            rows: batch.rows.iter().cloned().map(EditableRow::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, position: usize, field: LogicalField) -> Option<&str> {
        self.rows
            .get(position)
            .map(|row| row.values[EditableRow::slot(field)].as_str())
    }

    /// Replaces the live value of one field. Returns `false` for a row that
    /// does not exist.
    pub fn set_value(&mut self, position: usize, field: LogicalField, value: impl Into<String>) -> bool {
        match self.rows.get_mut(position) {
            Some(row) => {
                row.values[EditableRow::slot(field)] = value.into();
                true
            }
            None => {
                warn!(position, len = self.rows.len(), "edit for unknown row, ignoring");
                false
            }
        }
    }

    /// Splits the batch by decision. Allowed rows carry their edited values;
    /// denied rows contribute only their staged artifact reference.
    pub fn reconcile(&self, decisions: &DecisionTracker) -> AppResult<ReconciledSubmission> {
        if decisions.len() != self.rows.len() {
            return Err(AppError::Internal(format!(
                "decisions ({}) and rows ({}) out of step",
                decisions.len(),
                self.rows.len()
            )));
        }

        let mut submission = ReconciledSubmission::default();
        for ((position, decision), row) in decisions.iter().zip(&self.rows) {
            match decision {
                Decision::Allow => {
                    submission.save_rows.push(row.reconciled());
                    submission.save_positions.push(position);
                }
                Decision::Deny => {
                    if let Some(pending) = row.original.pending_file() {
                        submission.reject_files.push(pending.clone());
                    }
                }
            }
        }
        Ok(submission)
    }

    pub fn row_views(&self, decisions: &DecisionTracker) -> Vec<PendingRowView> {
        self.rows
            .iter()
            .enumerate()
            .map(|(position, row)| PendingRowView {
                position,
                label: row_label(&row.original, position),
                decision: decisions.get(position).unwrap_or_default(),
                fields: LogicalField::ALL
                    .iter()
                    .zip(&row.values)
                    .map(|(field, value)| (field.name().to_string(), value.clone()))
                    .collect(),
                extraction_error: row.original.extraction_error(),
                has_pending_file: row.original.pending_file().is_some(),
            })
            .collect()
    }
}
