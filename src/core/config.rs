use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::{AppError, AppResult};
use crate::db::{default_data_dir, DATA_DIR_NAME};
use crate::workflow::pending_store::SessionHandle;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const DEFAULT_UPLOADS_ROUTE: &str = "/uploads";
pub const DEFAULT_SESSION: &str = "local";
const DEFAULT_PENDING_TTL_HOURS: u64 = 24;

const API_BASE_ENV: &str = "NCRP_API_BASE";
const DATA_DIR_ENV: &str = "NCRP_DATA_DIR";
const SESSION_ENV: &str = "NCRP_SESSION";
const PENDING_TTL_ENV: &str = "NCRP_PENDING_TTL_HOURS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base address set explicitly by flag or environment. When present it
    /// wins over whatever the backend advertises.
    pub api_base_override: Option<String>,
    pub data_dir: PathBuf,
    pub session: String,
    pub pending_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_override: None,
            data_dir: PathBuf::from(DATA_DIR_NAME),
            session: DEFAULT_SESSION.to_string(),
            pending_ttl: Duration::from_secs(DEFAULT_PENDING_TTL_HOURS * 3600),
        }
    }
}

/// Values given on the command line; they take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub session: Option<String>,
}

impl AppConfig {
    pub fn load(overrides: ConfigOverrides) -> AppResult<Self> {
        let data_dir = default_data_dir(
            overrides
                .data_dir
                .clone()
                .or_else(|| non_empty_env(DATA_DIR_ENV).map(PathBuf::from)),
        )?;
        load_dotenv(&data_dir);
        Self::from_lookup(overrides, data_dir, non_empty_env)
    }

    fn from_lookup<F>(overrides: ConfigOverrides, data_dir: PathBuf, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_override = overrides
            .api_base
            .or_else(|| lookup(API_BASE_ENV))
            .map(|base| normalize_base(&base))
            .transpose()?;
        let requested = overrides
            .session
            .or_else(|| lookup(SESSION_ENV))
            .unwrap_or_else(|| DEFAULT_SESSION.to_string());
        let session = SessionHandle::resolve(&requested).to_string();
        if session != requested {
            tracing::info!(session = %session, "generated session handle");
        }
        let ttl_hours = match lookup(PENDING_TTL_ENV) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|err| {
                AppError::Config(format!("{PENDING_TTL_ENV} must be a whole number of hours: {err}"))
            })?,
            None => DEFAULT_PENDING_TTL_HOURS,
        };
        let ttl_secs = ttl_hours
            .checked_mul(3600)
            .ok_or_else(|| AppError::Config(format!("{PENDING_TTL_ENV} is too large: {ttl_hours}")))?;
        Ok(Self {
            api_base_override,
            data_dir,
            session,
            pending_ttl: Duration::from_secs(ttl_secs),
        })
    }

    /// Address used before the backend has been asked for its runtime config.
    pub fn bootstrap_base(&self) -> &str {
        self.api_base_override.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

/// Strips trailing slashes and rejects anything that is not an http(s) URL.
pub fn normalize_base(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|err| AppError::Config(format!("invalid api base {raw}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Config(format!("api base must be http or https: {raw}")));
    }
    Ok(trimmed.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `.env` next to the local state wins over one in the working directory;
/// neither overrides variables already set in the process.
fn load_dotenv(data_dir: &Path) {
    let env_path = data_dir.join(".env");
    if env_path.exists() {
        if let Err(err) = dotenvy::from_path(&env_path) {
            tracing::warn!(path = %env_path.display(), error = %err, "could not parse .env");
        }
    }
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn flags_win_over_environment() {
        let config = AppConfig::from_lookup(
            ConfigOverrides {
                api_base: Some("http://10.0.0.5:5000/".to_string()),
                data_dir: None,
                session: Some("desk-1".to_string()),
            },
            PathBuf::from(".ncrp"),
            lookup_from(&[(API_BASE_ENV, "http://ignored:1"), (SESSION_ENV, "env-session")]),
        )
        .expect("config");
        assert_eq!(config.api_base_override.as_deref(), Some("http://10.0.0.5:5000"));
        assert_eq!(config.session, "desk-1");
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config =
            AppConfig::from_lookup(ConfigOverrides::default(), PathBuf::from(".ncrp"), lookup_from(&[]))
                .expect("config");
        assert_eq!(config.api_base_override, None);
        assert_eq!(config.bootstrap_base(), DEFAULT_API_BASE);
        assert_eq!(config.session, DEFAULT_SESSION);
        assert_eq!(config.pending_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn bad_ttl_is_a_config_error() {
        let err = AppConfig::from_lookup(
            ConfigOverrides::default(),
            PathBuf::from(".ncrp"),
            lookup_from(&[(PENDING_TTL_ENV, "soon")]),
        )
        .expect_err("ttl should be rejected");
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn ttl_that_overflows_seconds_is_a_config_error() {
        let err = AppConfig::from_lookup(
            ConfigOverrides::default(),
            PathBuf::from(".ncrp"),
            lookup_from(&[(PENDING_TTL_ENV, "18446744073709551615")]),
        )
        .expect_err("ttl should be rejected");
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn new_session_gets_a_generated_handle() {
        let config = AppConfig::from_lookup(
            ConfigOverrides {
                session: Some("new".to_string()),
                ..ConfigOverrides::default()
            },
            PathBuf::from(".ncrp"),
            lookup_from(&[]),
        )
        .expect("config");
        assert_ne!(config.session, "new");
        assert!(!config.session.is_empty());
    }

    #[test]
    fn normalize_base_rejects_other_schemes() {
        assert!(normalize_base("ftp://host").is_err());
        assert_eq!(
            normalize_base(" https://api.example.org// ").expect("https base"),
            "https://api.example.org"
        );
    }
}
