use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::core::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

fn parse_timestamp(value: String) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|err| AppError::Database(format!("invalid timestamp {value}: {err}")))
}

pub async fn put_entry(pool: &SqlitePool, session_id: &str, key: &str, value: &str) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO session_entries (session_id, key, value)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (session_id, key) DO UPDATE
        SET value = excluded.value,
            updated_at = (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#,
    )
    .bind(session_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_entry(pool: &SqlitePool, session_id: &str, key: &str) -> AppResult<Option<SessionEntry>> {
    let row = sqlx::query(
        r#"
        SELECT value, updated_at
        FROM session_entries
        WHERE session_id = ?1 AND key = ?2
        "#,
    )
    .bind(session_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    row.map(|row| -> AppResult<SessionEntry> {
        let updated_at: String = row.try_get("updated_at")?;
        Ok(SessionEntry {
            value: row.try_get("value")?,
            updated_at: parse_timestamp(updated_at)?,
        })
    })
    .transpose()
}

pub async fn delete_entry(pool: &SqlitePool, session_id: &str, key: &str) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM session_entries WHERE session_id = ?1 AND key = ?2")
        .bind(session_id)
        .bind(key)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

/// Drops every entry last written before `cutoff`, across all sessions.
pub async fn purge_older_than(pool: &SqlitePool, cutoff: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = cutoff.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    let affected = sqlx::query("DELETE FROM session_entries WHERE updated_at < ?1")
        .bind(cutoff)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected)
}
