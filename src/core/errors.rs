use serde::ser::SerializeStruct;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {status}: {message}")]
    BackendStatus { status: u16, message: String },
    #[error("backend invalid response: {0}")]
    BackendInvalidResponse(String),
    #[error("Please select files to process")]
    NoFilesSelected,
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("No rows allowed: select at least one row to save")]
    NoRowsAllowed,
    #[error("No pending extracted data found. Please upload files first.")]
    NoPendingBatch,
    #[error("Save failed: {0}")]
    Submission(String),
    #[error("interrupted while an operation was in progress")]
    Interrupted,
    #[error("internal error: {0}")]
    Internal(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::BackendStatus { .. } => "BACKEND_STATUS",
            Self::BackendInvalidResponse(_) => "BACKEND_INVALID_RESPONSE",
            Self::NoFilesSelected => "NO_FILES_SELECTED",
            Self::Upload(_) => "UPLOAD_FAILED",
            Self::NoRowsAllowed => "NO_ROWS_ALLOWED",
            Self::NoPendingBatch => "NO_PENDING_BATCH",
            Self::Submission(_) => "SUBMISSION_FAILED",
            Self::Interrupted => "INTERRUPTED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Upload(_) | Self::Submission(_) | Self::BackendStatus { .. }
        )
    }

    /// The user-facing sentence without the variant prefix, used when one
    /// boundary error is folded into another.
    pub fn detail(&self) -> String {
        match self {
            Self::Upload(msg)
            | Self::Submission(msg)
            | Self::BackendInvalidResponse(msg)
            | Self::Network(msg) => msg.clone(),
            Self::BackendStatus { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Folds a transport-level error into the single message the upload view shows.
    pub fn into_upload(self) -> Self {
        match self {
            Self::Upload(_) | Self::NoFilesSelected => self,
            Self::Network(msg) => Self::Upload(format!("could not reach backend ({msg})")),
            other => Self::Upload(other.detail()),
        }
    }

    /// Folds a transport-level error into the single message the verification view shows.
    pub fn into_submission(self) -> Self {
        match self {
            Self::Submission(_) | Self::NoRowsAllowed | Self::NoPendingBatch => self,
            Self::Network(msg) => Self::Submission(format!("could not reach backend ({msg})")),
            other => Self::Submission(other.detail()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
