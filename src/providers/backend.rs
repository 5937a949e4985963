use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    core::{
        config::{normalize_base, DEFAULT_UPLOADS_ROUTE},
        errors::{AppError, AppResult},
        types::{
            CommitResult, ComplaintRecord, ComplaintsResponse, ExtractedRow, RuntimeConfig,
            UploadResponse, PENDING_FILE_KEY,
        },
    },
    workflow::selection::SelectedFile,
};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);
const READY_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything the workflow needs from the extraction/persistence backend.
#[async_trait]
pub trait IntakeBackend: Send + Sync {
    /// `POST /api/upload`, one multipart `files` part per selected file.
    async fn upload(&self, files: &[SelectedFile]) -> AppResult<UploadResponse>;

    /// `POST /api/verify` with `action: "save"`.
    async fn save_rows(&self, rows: &[ExtractedRow]) -> AppResult<CommitResult>;

    /// `POST /api/verify` with `action: "reject"`; only the staged artifact
    /// references are sent.
    async fn reject_rows(&self, pending_files: &[Value]) -> AppResult<()>;

    /// `GET /api/complaints`.
    async fn list_complaints(&self) -> AppResult<Vec<ComplaintRecord>>;

    /// `GET /api/config`.
    async fn runtime_config(&self) -> AppResult<RuntimeConfig>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base: normalize_base(base)?,
        })
    }

    /// Same connection pool, different base address.
    pub fn with_base(&self, base: &str) -> AppResult<Self> {
        Ok(Self {
            http: self.http.clone(),
            base: normalize_base(base)?,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Polls `/api/config` until the backend answers 200 or `timeout` elapses.
    pub async fn wait_until_ready(&self, timeout: Duration) -> AppResult<()> {
        let started = Instant::now();
        let url = self.endpoint("/api/config");
        loop {
            if started.elapsed() > timeout {
                return Err(AppError::Network("Backend startup timeout".to_string()));
            }
            match self
                .http
                .get(&url)
                .timeout(READY_REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!(base = %self.base, "backend is ready");
                    return Ok(());
                }
                Ok(response) => debug!(status = %response.status(), "backend not ready yet"),
                Err(err) => debug!(error = %err, "backend not reachable yet"),
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

fn network_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Network("request timed out".to_string())
    } else if err.is_connect() {
        AppError::Network("Check that the backend is running and try again.".to_string())
    } else {
        AppError::Network(err.to_string())
    }
}

fn error_field(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Turns a raw `/api/upload` reply into rows, or the message the upload view shows.
pub fn interpret_upload_reply(status: u16, body: &str) -> AppResult<UploadResponse> {
    if body.trim().is_empty() {
        return Err(AppError::Upload("Empty response from server".to_string()));
    }
    let value: Value = serde_json::from_str(body).map_err(|err| {
        warn!(status, error = %err, "non-JSON response from upload");
        AppError::Upload("Invalid response from server".to_string())
    })?;
    if !is_success(status) {
        return Err(AppError::Upload(
            error_field(&value).unwrap_or_else(|| "Upload failed".to_string()),
        ));
    }
    serde_json::from_value(value).map_err(|err| {
        warn!(error = %err, "upload response has an unexpected shape");
        AppError::Upload("Invalid response from server".to_string())
    })
}

/// Turns a raw `/api/verify` save reply into a commit result. Per-row failures
/// inside a 2xx reply are not errors here.
pub fn interpret_save_reply(status: u16, body: &str) -> AppResult<CommitResult> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    if !is_success(status) {
        let message = parsed
            .as_ref()
            .and_then(error_field)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(AppError::Submission(message));
    }
    let value = parsed.ok_or_else(|| AppError::Submission("Invalid response from server".to_string()))?;
    serde_json::from_value(value)
        .map_err(|err| AppError::Submission(format!("Invalid response from server: {err}")))
}

#[async_trait]
impl IntakeBackend for HttpBackend {
    async fn upload(&self, files: &[SelectedFile]) -> AppResult<UploadResponse> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(file.mime)
                .map_err(|err| AppError::Internal(err.to_string()))?;
            form = form.part("files", part);
        }

        let url = self.endpoint("/api/upload");
        info!(url = %url, files = files.len(), "uploading files for extraction");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;
        interpret_upload_reply(status, &body)
    }

    async fn save_rows(&self, rows: &[ExtractedRow]) -> AppResult<CommitResult> {
        let url = self.endpoint("/api/verify");
        info!(url = %url, rows = rows.len(), "submitting rows for save");
        let payload = serde_json::json!({
            "action": "save",
            "rows": rows,
        });
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;
        interpret_save_reply(status, &body)
    }

    async fn reject_rows(&self, pending_files: &[Value]) -> AppResult<()> {
        let url = self.endpoint("/api/verify");
        let rows: Vec<Value> = pending_files
            .iter()
            .map(|pending| serde_json::json!({ PENDING_FILE_KEY: pending }))
            .collect();
        debug!(url = %url, rows = rows.len(), "submitting rejected artifacts for cleanup");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "action": "reject", "rows": rows }))
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::BackendStatus {
                status: status.as_u16(),
                message: "reject cleanup was not accepted".to_string(),
            });
        }
        Ok(())
    }

    async fn list_complaints(&self) -> AppResult<Vec<ComplaintRecord>> {
        let url = self.endpoint("/api/complaints");
        let response = self.http.get(&url).send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(error_field)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        format!("HTTP {status}")
                    } else {
                        body.clone()
                    }
                });
            return Err(AppError::BackendStatus {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: ComplaintsResponse = serde_json::from_str(&body)
            .map_err(|err| AppError::BackendInvalidResponse(err.to_string()))?;
        Ok(parsed.rows)
    }

    async fn runtime_config(&self) -> AppResult<RuntimeConfig> {
        let url = self.endpoint("/api/config");
        let response = self.http.get(&url).send().await.map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::BackendStatus {
                status: status.as_u16(),
                message: "config fetch failed".to_string(),
            });
        }
        response
            .json()
            .await
            .map_err(|err| AppError::BackendInvalidResponse(err.to_string()))
    }
}

/// Base address and uploads route the rest of the session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub uploads_route: String,
}

/// Asks the backend for its runtime config. An explicit override keeps its
/// base address; otherwise the advertised `API_BASE` is adopted. When the
/// fetch fails the bootstrap address stays in use.
pub async fn resolve_endpoints<B>(backend: &B, bootstrap_base: &str, override_base: Option<&str>) -> Endpoints
where
    B: IntakeBackend + ?Sized,
{
    let fallback = Endpoints {
        api_base: override_base.unwrap_or(bootstrap_base).to_string(),
        uploads_route: DEFAULT_UPLOADS_ROUTE.to_string(),
    };
    let runtime = match backend.runtime_config().await {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(error = %err, base = %fallback.api_base, "could not load runtime config, using defaults");
            return fallback;
        }
    };

    let advertised = runtime
        .api_base
        .as_deref()
        .and_then(|base| match normalize_base(base) {
            Ok(base) => Some(base),
            Err(err) => {
                warn!(error = %err, "ignoring advertised api base");
                None
            }
        });
    let api_base = match override_base {
        Some(base) => base.to_string(),
        None => advertised.unwrap_or(fallback.api_base),
    };
    let uploads_route = runtime
        .uploads_route
        .map(|route| route.trim().to_string())
        .filter(|route| !route.is_empty())
        .map(|route| if route.starts_with('/') { route } else { format!("/{route}") })
        .unwrap_or(fallback.uploads_route);

    info!(api_base = %api_base, uploads_route = %uploads_route, "loaded runtime config");
    Endpoints {
        api_base,
        uploads_route,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_reply_prefers_backend_error_field() {
        let err = interpret_upload_reply(400, r#"{"error":"no files provided"}"#).expect_err("400");
        assert_eq!(err.to_string(), "Upload failed: no files provided");
    }

    #[test]
    fn upload_reply_without_error_field_uses_generic_message() {
        let err = interpret_upload_reply(500, r#"{"detail":"boom"}"#).expect_err("500");
        assert_eq!(err.detail(), "Upload failed");
    }

    #[test]
    fn upload_reply_rejects_empty_and_non_json_bodies() {
        let empty = interpret_upload_reply(200, "  ").expect_err("empty");
        assert_eq!(empty.detail(), "Empty response from server");
        let html = interpret_upload_reply(502, "<html>Bad Gateway</html>").expect_err("html");
        assert_eq!(html.detail(), "Invalid response from server");
    }

    #[test]
    fn upload_reply_defaults_missing_collections() {
        let reply = interpret_upload_reply(200, r#"{"rows":[{"Complaint ID":"C-1"}]}"#).expect("ok");
        assert_eq!(reply.rows.len(), 1);
        assert!(reply.files.is_empty());
    }

    #[test]
    fn save_reply_non_ok_uses_error_field_or_status() {
        let with_field = interpret_save_reply(500, r#"{"error":"DB_USER not configured on server"}"#)
            .expect_err("500");
        assert_eq!(with_field.detail(), "DB_USER not configured on server");
        let bare = interpret_save_reply(503, "").expect_err("503");
        assert_eq!(bare.detail(), "HTTP 503");
    }

    #[test]
    fn save_reply_ok_with_garbage_is_a_submission_error() {
        let err = interpret_save_reply(200, "not json").expect_err("garbage");
        assert_eq!(err.code(), "SUBMISSION_FAILED");
    }

    #[test]
    fn save_reply_accepts_legacy_excel_info_key() {
        let result = interpret_save_reply(
            200,
            r#"{"saved_count":1,"excel_info":{"filename":"ncrp_complaints.xlsx"}}"#,
        )
        .expect("ok");
        assert_eq!(result.saved_count, 1);
        assert_eq!(result.excel_location().as_deref(), Some("ncrp_complaints.xlsx"));
    }
}
