use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use tracing::debug;

use crate::core::errors::{AppError, AppResult};

pub mod repositories;

pub const DATA_DIR_NAME: &str = ".ncrp";
pub const DB_FILE_NAME: &str = "ncrp_intake.sqlite";

static MIGRATOR: Migrator = sqlx::migrate!("./src/db/migrations");

/// Local state shared by every CLI invocation pointed at the same data dir.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    pub async fn new(data_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DB_FILE_NAME);
        let connect_options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Two terminals may stage and commit against the same file.
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect_options)
            .await?;
        MIGRATOR.run(&pool).await?;
        debug!(path = %path.display(), "opened local state");
        Ok(Self { pool, path: Some(path) })
    }

    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool, path: None })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// File backing this database; `None` for an in-memory one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// `base` when given, otherwise `.ncrp` under the working directory.
pub fn default_data_dir(base: Option<PathBuf>) -> AppResult<PathBuf> {
    match base {
        Some(path) => Ok(path),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(DATA_DIR_NAME))
            .map_err(|err| AppError::Io(err.to_string())),
    }
}
