pub mod cli;
pub mod commands;
pub mod core;
pub mod db;
pub mod insights;
pub mod providers;
pub mod workflow;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::config::{AppConfig, DEFAULT_UPLOADS_ROUTE};
use crate::core::errors::AppResult;
use crate::db::Database;
use crate::providers::backend::{resolve_endpoints, Endpoints, HttpBackend};
use crate::workflow::{
    busy::BusyState,
    pending_store::{PendingRowStore, SessionHandle},
};

fn log_level_from_env() -> &'static str {
    match std::env::var("NCRP_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

fn sqlx_debug_enabled() -> bool {
    matches!(
        std::env::var("NCRP_SQLX_DEBUG")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { log_level_from_env() };
    let directives = if sqlx_debug_enabled() {
        level.to_string()
    } else {
        format!("{level},sqlx::query=warn")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub backend: HttpBackend,
    pub busy: BusyState,
    pub endpoints: Endpoints,
}

impl AppState {
    /// Opens local state. No network traffic happens here; see [`AppState::connect`].
    pub async fn initialize(config: AppConfig) -> AppResult<Self> {
        let db = Database::new(&config.data_dir).await?;
        let backend = HttpBackend::new(config.bootstrap_base())?;
        let endpoints = Endpoints {
            api_base: backend.base().to_string(),
            uploads_route: DEFAULT_UPLOADS_ROUTE.to_string(),
        };
        let state = Self {
            config,
            db,
            backend,
            busy: BusyState::new(),
            endpoints,
        };

        match state.pending_store().purge_expired().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "dropped expired pending batches"),
            Err(err) => warn!(error = %err, "could not purge expired pending batches"),
        }
        Ok(state)
    }

    /// Loads the backend's runtime config and points the client at the
    /// advertised base unless one was set explicitly.
    pub async fn connect(&mut self) -> AppResult<()> {
        let endpoints = resolve_endpoints(
            &self.backend,
            self.config.bootstrap_base(),
            self.config.api_base_override.as_deref(),
        )
        .await;
        if endpoints.api_base != self.backend.base() {
            self.backend = self.backend.with_base(&endpoints.api_base)?;
        }
        self.endpoints = endpoints;
        Ok(())
    }

    pub fn pending_store(&self) -> PendingRowStore {
        PendingRowStore::new(
            self.db.clone(),
            SessionHandle::from(self.config.session.as_str()),
            self.config.pending_ttl,
        )
    }
}

pub async fn run() -> AppResult<()> {
    let cli = <cli::Cli as clap::Parser>::parse();
    cli::run(cli).await
}
