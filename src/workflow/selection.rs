use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Csv,
    Spreadsheet,
    Pdf,
    Image,
    Other,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Self::Csv,
            "xlsx" | "xls" => Self::Spreadsheet,
            "pdf" => Self::Pdf,
            "jpg" | "jpeg" | "png" => Self::Image,
            _ => Self::Other,
        }
    }
}

fn mime_for(name: &str, kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Csv => "text/csv",
        DocumentKind::Spreadsheet if name.to_ascii_lowercase().ends_with(".xls") => {
            "application/vnd.ms-excel"
        }
        DocumentKind::Spreadsheet => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        DocumentKind::Pdf => "application/pdf",
        DocumentKind::Image if name.to_ascii_lowercase().ends_with(".png") => "image/png",
        DocumentKind::Image => "image/jpeg",
        DocumentKind::Other => "application/octet-stream",
    }
}

/// A user-selected file, read into memory ready for the multipart upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
    pub mime: &'static str,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = DocumentKind::from_file_name(&name);
        let mime = mime_for(&name, kind);
        Self {
            name,
            bytes,
            kind,
            mime,
        }
    }

    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::Upload(format!("File not found: {}", path.display()))
            } else {
                AppError::Upload(format!("Could not read {}: {err}", path.display()))
            }
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let file = Self::new(name, bytes);
        if file.kind == DocumentKind::Other {
            tracing::warn!(file = %file.name, "unrecognized document type, sending as binary");
        }
        Ok(file)
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.bytes.len() as u64)
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
