use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::errors::AppError;

/// Key under which the backend attaches the staged source artifact of a row.
pub const PENDING_FILE_KEY: &str = "pending_file";

/// Renders a loosely typed JSON value as display text. `null` has no text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_text))
}

/// One record extracted from an uploaded document. The shape is not fixed:
/// keys come from CSV headers, spreadsheet cells or PDF/OCR text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRow(BTreeMap<String, Value>);

impl ExtractedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), Value::String(value.into())))
                .collect(),
        )
    }

    /// Non-empty text stored under `key`, if any.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(value_text)
            .filter(|text| !text.is_empty())
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    pub fn pending_file(&self) -> Option<&Value> {
        self.0.get(PENDING_FILE_KEY).filter(|value| !value.is_null())
    }

    /// Rows the backend could not extract come back as `Source: "ERROR"`.
    pub fn extraction_error(&self) -> Option<String> {
        if self.text("Source").as_deref() != Some("ERROR") {
            return None;
        }
        let reason = self.text("error").unwrap_or_else(|| "extraction failed".to_string());
        Some(match self.text("file") {
            Some(file) => format!("{file}: {reason}"),
            None => reason,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rows extracted from one upload, awaiting allow/deny decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingBatch {
    #[serde(default)]
    pub rows: Vec<ExtractedRow>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl PendingBatch {
    pub fn new(rows: Vec<ExtractedRow>, files: Vec<String>) -> Self {
        Self { rows, files }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Allow,
    Deny,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(AppError::InvalidInput(format!("unknown decision {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedRow {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Per-row outcome reported by the backend for a save submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    #[serde(default)]
    pub saved_count: usize,
    #[serde(default)]
    pub failed_count: usize,
    #[serde(default)]
    pub skipped_count: usize,
    #[serde(default)]
    pub failed: Vec<FailedRow>,
    #[serde(default)]
    pub skipped: Vec<SkippedRow>,
    #[serde(default, alias = "excel_info")]
    pub excel: Option<Value>,
    #[serde(default)]
    pub excel_errors: Vec<String>,
}

impl CommitResult {
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0 || !self.failed.is_empty()
    }

    pub fn has_skips(&self) -> bool {
        self.skipped_count > 0 || !self.skipped.is_empty()
    }

    /// Where the backend wrote its spreadsheet copy: `path`, else `filename`,
    /// else the raw descriptor.
    pub fn excel_location(&self) -> Option<String> {
        let excel = self.excel.as_ref().filter(|value| !value.is_null())?;
        excel
            .get("path")
            .and_then(value_text)
            .or_else(|| excel.get("filename").and_then(value_text))
            .or_else(|| Some(excel.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub rows: Vec<ExtractedRow>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default, rename = "API_BASE", alias = "api_base")]
    pub api_base: Option<String>,
    #[serde(default, rename = "UPLOADS_ROUTE", alias = "uploads_route")]
    pub uploads_route: Option<String>,
}

/// A committed complaint as listed by `GET /api/complaints`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub complaint_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub incident_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district_state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cybercrime_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform_involved: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_amount_loss: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub processed_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub saved_filename: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplaintsResponse {
    #[serde(default)]
    pub rows: Vec<ComplaintRecord>,
}

/// Where the host should go after an operation completes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    Verification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadResponse {
    pub session: String,
    pub row_count: usize,
    pub files: Vec<String>,
    pub navigate_to: View,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRowView {
    pub position: usize,
    pub label: String,
    pub decision: Decision,
    pub fields: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
    pub has_pending_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBatchView {
    pub session: String,
    pub files: Vec<String>,
    pub rows: Vec<PendingRowView>,
    pub allowed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearPendingResponse {
    pub cleared: bool,
}
