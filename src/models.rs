use serde::{Deserialize, Serialize};

pub use statement_xlsx::DEFAULT_OUTPUT_PREFIX;

/// Multipart field carrying the uploaded PDFs.
pub const UPLOAD_FIELD: &str = "files";
/// Response header with the URL-encoded JSON [`ConversionReport`].
pub const REPORT_HEADER: &str = "X-Conversion-Report";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub status: FileStatus,
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionReport {
    pub files: Vec<FileReport>,
    pub converted: usize,
    pub skipped: usize,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
