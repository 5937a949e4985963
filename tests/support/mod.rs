#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ncrp_intake_lib::{
    core::{
        errors::{AppError, AppResult},
        types::{CommitResult, ComplaintRecord, ExtractedRow, PendingBatch, RuntimeConfig, UploadResponse},
    },
    db::Database,
    providers::backend::IntakeBackend,
    workflow::{
        busy::BusyState,
        pending_store::{PendingRowStore, SessionHandle},
        selection::SelectedFile,
    },
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(Vec<String>),
    Save(Vec<ExtractedRow>),
    Reject(Vec<Value>),
    ListComplaints,
    RuntimeConfig,
}

/// In-process backend that records every call and replays scripted replies.
#[derive(Default)]
pub struct FakeBackend {
    upload_response: Mutex<UploadResponse>,
    upload_failures: Mutex<VecDeque<AppError>>,
    save_response: Mutex<CommitResult>,
    save_failures: Mutex<VecDeque<AppError>>,
    reject_failure: Mutex<Option<AppError>>,
    complaints: Mutex<Vec<ComplaintRecord>>,
    runtime: Mutex<Option<RuntimeConfig>>,
    observed_busy: Mutex<Option<BusyState>>,
    busy_during_calls: Mutex<Vec<bool>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload(self, rows: Vec<ExtractedRow>, files: &[&str]) -> Self {
        *self.upload_response.lock().expect("lock") = UploadResponse {
            rows,
            files: files.iter().map(|name| name.to_string()).collect(),
        };
        self
    }

    pub fn failing_upload(self, err: AppError) -> Self {
        self.upload_failures.lock().expect("lock").push_back(err);
        self
    }

    pub fn with_save(self, result: CommitResult) -> Self {
        *self.save_response.lock().expect("lock") = result;
        self
    }

    pub fn failing_save(self, err: AppError) -> Self {
        self.save_failures.lock().expect("lock").push_back(err);
        self
    }

    pub fn failing_reject(self, err: AppError) -> Self {
        *self.reject_failure.lock().expect("lock") = Some(err);
        self
    }

    pub fn with_complaints(self, records: Vec<ComplaintRecord>) -> Self {
        *self.complaints.lock().expect("lock") = records;
        self
    }

    pub fn with_runtime(self, runtime: RuntimeConfig) -> Self {
        *self.runtime.lock().expect("lock") = Some(runtime);
        self
    }

    /// Records whether `busy` was set while each call was being served.
    pub fn observing(self, busy: &BusyState) -> Self {
        *self.observed_busy.lock().expect("lock") = Some(busy.clone());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn busy_during_calls(&self) -> Vec<bool> {
        self.busy_during_calls.lock().expect("lock").clone()
    }

    pub fn save_calls(&self) -> Vec<Vec<ExtractedRow>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Save(rows) => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn reject_calls(&self) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reject(files) => Some(files),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        let busy = self
            .observed_busy
            .lock()
            .expect("lock")
            .as_ref()
            .map(BusyState::is_busy)
            .unwrap_or(false);
        self.busy_during_calls.lock().expect("lock").push(busy);
        self.calls.lock().expect("lock").push(call);
    }
}

#[async_trait]
impl IntakeBackend for FakeBackend {
    async fn upload(&self, files: &[SelectedFile]) -> AppResult<UploadResponse> {
        self.record(Call::Upload(files.iter().map(|file| file.name.clone()).collect()));
        tokio::time::sleep(Duration::from_millis(1)).await;
        if let Some(err) = self.upload_failures.lock().expect("lock").pop_front() {
            return Err(err);
        }
        Ok(self.upload_response.lock().expect("lock").clone())
    }

    async fn save_rows(&self, rows: &[ExtractedRow]) -> AppResult<CommitResult> {
        self.record(Call::Save(rows.to_vec()));
        if let Some(err) = self.save_failures.lock().expect("lock").pop_front() {
            return Err(err);
        }
        Ok(self.save_response.lock().expect("lock").clone())
    }

    async fn reject_rows(&self, pending_files: &[Value]) -> AppResult<()> {
        self.record(Call::Reject(pending_files.to_vec()));
        match self.reject_failure.lock().expect("lock").take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_complaints(&self) -> AppResult<Vec<ComplaintRecord>> {
        self.record(Call::ListComplaints);
        Ok(self.complaints.lock().expect("lock").clone())
    }

    async fn runtime_config(&self) -> AppResult<RuntimeConfig> {
        self.record(Call::RuntimeConfig);
        self.runtime
            .lock()
            .expect("lock")
            .clone()
            .ok_or_else(|| AppError::Network("connection refused".to_string()))
    }
}

pub fn row(pairs: &[(&str, &str)]) -> ExtractedRow {
    ExtractedRow::from_pairs(pairs.iter().copied())
}

pub fn row_with_pending(pairs: &[(&str, &str)], pending_file: &str) -> ExtractedRow {
    let mut row = row(pairs);
    row.set_text("pending_file", pending_file);
    row
}

pub fn two_row_batch() -> PendingBatch {
    PendingBatch::new(
        vec![
            row_with_pending(
                &[("complaint_id", "NCRP-1"), ("email", "old@x.com"), ("mobile", "555")],
                "staged/a.png",
            ),
            row_with_pending(&[("complaint_id", "NCRP-2"), ("type", "UPI Fraud")], "staged/b.png"),
        ],
        vec!["a.csv".to_string()],
    )
}

pub async fn store_for(session: &str) -> PendingRowStore {
    let db = Database::in_memory().await.expect("db should initialize");
    PendingRowStore::new(db, SessionHandle::from(session), Duration::from_secs(24 * 3600))
}
