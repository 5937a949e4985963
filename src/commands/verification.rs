use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{ClearPendingResponse, PendingBatchView},
    },
    workflow::{commit::CommitSummary, session::VerificationSession},
    AppState,
};

/// The staged batch with default decisions, or `None` when nothing is pending.
pub async fn get_pending_batch(state: &AppState) -> AppResult<Option<PendingBatchView>> {
    match VerificationSession::resume(&state.pending_store()).await {
        Ok(session) => Ok(Some(session.view(&state.config.session))),
        Err(AppError::NoPendingBatch) => Ok(None),
        Err(err) => Err(err),
    }
}

pub async fn start_verification(state: &AppState) -> AppResult<VerificationSession> {
    VerificationSession::resume(&state.pending_store()).await
}

pub async fn submit_verification(
    state: &AppState,
    session: &mut VerificationSession,
) -> AppResult<CommitSummary> {
    let store = state.pending_store();
    session.commit(&state.backend, &store, &state.busy).await
}

pub async fn clear_pending(state: &AppState) -> AppResult<ClearPendingResponse> {
    let cleared = state.pending_store().clear().await?;
    Ok(ClearPendingResponse { cleared })
}
