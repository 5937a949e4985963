use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    core::{errors::AppResult, types::PendingBatch},
    db::{repositories::session, Database},
};

pub const PENDING_ROWS_KEY: &str = "ncrp_pending_rows";
/// Session name that asks for a freshly generated handle.
pub const NEW_SESSION: &str = "new";

/// Opaque handle keying one client session's staged state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// `new` yields a generated handle; anything else is used as given.
    pub fn resolve(requested: &str) -> Self {
        if requested.eq_ignore_ascii_case(NEW_SESSION) {
            Self::generate()
        } else {
            Self::from(requested)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds the rows of the last successful upload until they are committed or
/// cleared. Absent, expired or unreadable state all read as "no pending batch".
#[derive(Clone)]
pub struct PendingRowStore {
    db: Database,
    session: SessionHandle,
    ttl: Duration,
}

impl PendingRowStore {
    pub fn new(db: Database, session: SessionHandle, ttl: Duration) -> Self {
        Self { db, session, ttl }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn save(&self, batch: &PendingBatch) -> AppResult<()> {
        let serialized = serde_json::to_string(batch)?;
        session::put_entry(self.db.pool(), self.session.as_str(), PENDING_ROWS_KEY, &serialized).await?;
        debug!(session = %self.session, rows = batch.len(), "staged pending batch");
        Ok(())
    }

    pub async fn load(&self) -> AppResult<Option<PendingBatch>> {
        let Some(entry) = session::get_entry(self.db.pool(), self.session.as_str(), PENDING_ROWS_KEY).await?
        else {
            return Ok(None);
        };

        let age = Utc::now().signed_duration_since(entry.updated_at);
        if age.to_std().map(|age| age > self.ttl).unwrap_or(false) {
            debug!(session = %self.session, "pending batch expired");
            self.clear().await?;
            return Ok(None);
        }

        match serde_json::from_str::<PendingBatch>(&entry.value) {
            Ok(batch) => Ok(Some(batch)),
            Err(err) => {
                warn!(session = %self.session, error = %err, "failed to read pending rows");
                Ok(None)
            }
        }
    }

    /// Returns whether a batch was actually removed.
    pub async fn clear(&self) -> AppResult<bool> {
        session::delete_entry(self.db.pool(), self.session.as_str(), PENDING_ROWS_KEY).await
    }

    /// Drops staged state of every session older than the TTL.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let cutoff = Utc::now()
            .checked_sub_signed(ttl)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
        session::purge_older_than(self.db.pool(), cutoff).await
    }
}
