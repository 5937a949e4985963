mod support;

use ncrp_intake_lib::{
    commands::verification::{clear_pending, get_pending_batch, start_verification},
    core::{config::AppConfig, errors::AppError},
    AppState,
};
use support::two_row_batch;

async fn state_in(dir: &tempfile::TempDir, session: &str) -> AppState {
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        session: session.to_string(),
        ..AppConfig::default()
    };
    AppState::initialize(config).await.expect("state should initialize")
}

#[tokio::test]
async fn pending_batch_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let state = state_in(&dir, "desk-1").await;
        state.pending_store().save(&two_row_batch()).await.expect("stage batch");
    }

    let state = state_in(&dir, "desk-1").await;
    let view = get_pending_batch(&state)
        .await
        .expect("query pending")
        .expect("batch present");
    assert_eq!(view.session, "desk-1");
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.allowed, 2);
    assert_eq!(view.files, vec!["a.csv".to_string()]);
}

#[tokio::test]
async fn clear_command_drops_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state_in(&dir, "desk-1").await;
    state.pending_store().save(&two_row_batch()).await.expect("stage batch");

    assert!(clear_pending(&state).await.expect("clear").cleared);
    assert!(!clear_pending(&state).await.expect("clear again").cleared);
    assert!(get_pending_batch(&state).await.expect("query pending").is_none());
    assert!(matches!(
        start_verification(&state).await,
        Err(AppError::NoPendingBatch)
    ));
}

#[tokio::test]
async fn state_starts_on_bootstrap_endpoints() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state_in(&dir, "desk-1").await;
    assert_eq!(state.endpoints.api_base, "http://localhost:5000");
    assert_eq!(state.endpoints.uploads_route, "/uploads");
    assert!(!state.busy.is_busy());
}
