use std::path::PathBuf;

use crate::{
    core::{errors::AppResult, types::StagedUploadResponse},
    workflow::upload::UploadOrchestrator,
    AppState,
};

pub async fn upload_files(state: &AppState, paths: &[PathBuf]) -> AppResult<StagedUploadResponse> {
    let store = state.pending_store();
    let staged = UploadOrchestrator::new(&state.backend, &store, &state.busy)
        .upload_paths(paths)
        .await?;
    Ok(StagedUploadResponse {
        session: store.session().to_string(),
        row_count: staged.batch.len(),
        files: staged.batch.files,
        navigate_to: staged.navigate_to,
    })
}
