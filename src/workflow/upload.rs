use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{PendingBatch, View},
    },
    providers::backend::IntakeBackend,
    workflow::{busy::BusyState, pending_store::PendingRowStore, selection::SelectedFile},
};

#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub batch: PendingBatch,
    pub navigate_to: View,
}

pub struct UploadOrchestrator<'a, B: ?Sized> {
    backend: &'a B,
    store: &'a PendingRowStore,
    busy: &'a BusyState,
}

impl<'a, B> UploadOrchestrator<'a, B>
where
    B: IntakeBackend + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a PendingRowStore, busy: &'a BusyState) -> Self {
        Self { backend, store, busy }
    }

    /// Reads the selected paths and uploads them.
    pub async fn upload_paths(&self, paths: &[PathBuf]) -> AppResult<StagedUpload> {
        if paths.is_empty() {
            return Err(AppError::NoFilesSelected);
        }
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(SelectedFile::from_path(path).await?);
        }
        self.upload(files).await
    }

    /// Posts the files for extraction and stages the returned rows for
    /// verification. The busy guard is held for the whole exchange. An
    /// extraction with no rows stages nothing and leaves any earlier batch
    /// in place.
    pub async fn upload(&self, files: Vec<SelectedFile>) -> AppResult<StagedUpload> {
        if files.is_empty() {
            return Err(AppError::NoFilesSelected);
        }

        let _busy = self.busy.acquire("upload");
        let response = self.backend.upload(&files).await.map_err(|err| {
            error!(error = %err, files = files.len(), "upload failed");
            err.into_upload()
        })?;

        let batch = PendingBatch::new(response.rows, response.files);
        if batch.is_empty() {
            warn!(files = batch.files.len(), "no rows were extracted, nothing staged");
            return Ok(StagedUpload {
                batch,
                navigate_to: View::Dashboard,
            });
        }
        self.store.save(&batch).await.map_err(|err| {
            error!(error = %err, "could not stage extracted rows");
            AppError::Upload(format!("could not stage extracted rows: {}", err.detail()))
        })?;
        info!(
            session = %self.store.session(),
            rows = batch.len(),
            files = batch.files.len(),
            "extracted rows staged for verification"
        );

        Ok(StagedUpload {
            batch,
            navigate_to: View::Verification,
        })
    }
}
