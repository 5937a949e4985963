use std::time::Duration;

use serde::Serialize;

use crate::{core::errors::AppResult, AppState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub ready: bool,
    pub api_base: String,
    pub uploads_route: String,
}

pub async fn wait_ready(state: &AppState, timeout: Duration) -> AppResult<ReadyResponse> {
    state.backend.wait_until_ready(timeout).await?;
    Ok(ReadyResponse {
        ready: true,
        api_base: state.endpoints.api_base.clone(),
        uploads_route: state.endpoints.uploads_route.clone(),
    })
}
