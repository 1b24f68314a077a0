use chrono::{DateTime, Utc};
use statement_xlsx::{
    BatchReport, DataTable, ExportFormat, FileOutcome, UploadedFile, convert_batch, export_table,
    output_file_name,
};
use worker::{FormEntry, Request};

use crate::error::ApiError;
use crate::models::{ConversionReport, FileReport, FileStatus, UPLOAD_FIELD};

/// A PDF read out of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of a conversion request once every upload has been processed.
#[derive(Debug)]
pub enum ConversionResult {
    Ready {
        file_name: String,
        format: ExportFormat,
        bytes: Vec<u8>,
        report: ConversionReport,
    },
    NothingConverted(ConversionReport),
}

pub fn is_multipart(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| {
        value
            .trim()
            .to_ascii_lowercase()
            .starts_with("multipart/form-data")
    })
}

pub fn upload_display_name(raw_name: &str, position: usize) -> String {
    let trimmed = raw_name.trim();
    if trimmed.is_empty() {
        format!("upload-{}.pdf", position + 1)
    } else {
        trimmed.to_string()
    }
}

pub async fn read_uploads(req: &mut Request) -> Result<Vec<Upload>, ApiError> {
    let content_type = req.headers().get("Content-Type")?;
    if !is_multipart(content_type.as_deref()) {
        return Err(ApiError::UnsupportedMediaType(
            "expected multipart/form-data upload".to_string(),
        ));
    }

    let form = req.form_data().await?;
    let entries = form.get_all(UPLOAD_FIELD).unwrap_or_default();

    let mut uploads = Vec::new();
    for entry in entries {
        let FormEntry::File(file) = entry else {
            continue;
        };
        let file_name = upload_display_name(&file.name(), uploads.len());
        let bytes = file.bytes().await?;
        uploads.push(Upload { file_name, bytes });
    }

    if uploads.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "no PDF files found in form field '{UPLOAD_FIELD}'"
        )));
    }
    Ok(uploads)
}

pub fn convert_uploads(uploads: &[Upload]) -> BatchReport {
    convert_batch(uploads.iter().map(|upload| UploadedFile {
        file_name: &upload.file_name,
        bytes: &upload.bytes,
    }))
}

pub fn file_report(outcome: &FileOutcome) -> FileReport {
    match outcome {
        FileOutcome::Converted {
            file_name,
            table,
            warnings,
        } => FileReport {
            file_name: file_name.clone(),
            status: FileStatus::Converted,
            rows: table.row_count(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
            message: None,
        },
        FileOutcome::Skipped { file_name, error } => FileReport {
            file_name: file_name.clone(),
            status: FileStatus::Skipped,
            rows: 0,
            warnings: Vec::new(),
            message: Some(error.to_string()),
        },
    }
}

pub fn build_report(
    batch: &BatchReport,
    combined: Option<&DataTable>,
    output_file: Option<String>,
) -> ConversionReport {
    ConversionReport {
        files: batch.outcomes.iter().map(file_report).collect(),
        converted: batch.converted_count(),
        skipped: batch.skipped_count(),
        row_count: combined.map_or(0, DataTable::row_count),
        columns: combined.map(|table| table.columns.clone()).unwrap_or_default(),
        output_file,
    }
}

/// Combines the converted tables and encodes them; no file when nothing converted.
pub fn finish_batch(
    batch: &BatchReport,
    format: ExportFormat,
    output_prefix: &str,
    generated_at: &DateTime<Utc>,
) -> Result<ConversionResult, ApiError> {
    let Some(combined) = batch.combined() else {
        return Ok(ConversionResult::NothingConverted(build_report(
            batch, None, None,
        )));
    };

    let bytes = export_table(&combined, format)?;
    let file_name = output_file_name(output_prefix, generated_at, format);
    let report = build_report(batch, Some(&combined), Some(file_name.clone()));

    Ok(ConversionResult::Ready {
        file_name,
        format,
        bytes,
        report,
    })
}

pub fn encode_report_header(report: &ConversionReport) -> Result<String, ApiError> {
    let json = serde_json::to_string(report)?;
    Ok(urlencoding::encode(&json).into_owned())
}
