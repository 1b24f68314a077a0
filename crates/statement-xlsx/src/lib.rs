mod clean;
mod combine;
mod error;
mod export;
mod frame;
mod layout;
mod model;
mod options;
mod pdf_reader;
mod table_detect;
mod table_parse;
mod warning;

use tracing::{debug, info, warn};

use crate::model::PageText;
use crate::pdf_reader::read_pdf_text;
use crate::table_detect::extract_page_grids;

pub use clean::{clean_cell, clean_table, prune_sparse_columns, trim_trailing_empty_columns};
pub use combine::combine_tables;
pub use error::ExtractError;
pub use export::{
    DEFAULT_OUTPUT_PREFIX, SHEET_NAME, export_table, output_file_name, write_csv_to_string,
    write_xlsx, write_xlsx_to_buffer,
};
pub use frame::{ReferenceFields, build_document_table, scan_metadata, scan_reference_fields};
pub use layout::StatementLayout;
pub use model::{Cell, DataTable, RawRows};
pub use options::ExportFormat;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

/// Grid rows of one PDF, plus the warnings raised while reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtraction {
    pub rows: RawRows,
    pub warnings: Vec<ExtractWarning>,
}

/// An uploaded document: its display name and raw bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadedFile<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

/// What happened to one file of a batch.
#[derive(Debug)]
pub enum FileOutcome {
    Converted {
        file_name: String,
        table: DataTable,
        warnings: Vec<ExtractWarning>,
    },
    Skipped {
        file_name: String,
        error: ExtractError,
    },
}

impl FileOutcome {
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Converted { file_name, .. } | Self::Skipped { file_name, .. } => file_name,
        }
    }

    #[must_use]
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    #[must_use]
    pub fn table(&self) -> Option<&DataTable> {
        match self {
            Self::Converted { table, .. } => Some(table),
            Self::Skipped { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExtractError> {
        match self {
            Self::Converted { .. } => None,
            Self::Skipped { error, .. } => Some(error),
        }
    }
}

/// Outcomes of one upload batch, in upload order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn converted_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_converted()).count()
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.converted_count()
    }

    /// Union of every converted table, or `None` when nothing converted.
    #[must_use]
    pub fn combined(&self) -> Option<DataTable> {
        let tables = self
            .outcomes
            .iter()
            .filter_map(FileOutcome::table)
            .cloned()
            .collect::<Vec<_>>();
        if tables.is_empty() {
            return None;
        }
        Some(combine_tables(&tables))
    }
}

fn rows_from_pages(pages: &[PageText], full_text: Option<&str>) -> RawExtraction {
    let mut warnings = Vec::new();
    let mut rows = extract_page_grids(pages, &mut warnings);

    if rows.is_empty()
        && let Some(text) = full_text.filter(|text| !text.trim().is_empty())
    {
        let fallback_pages = vec![PageText {
            page_number: 1,
            text: text.to_string(),
        }];
        let fallback_rows = extract_page_grids(&fallback_pages, &mut warnings);
        if !fallback_rows.is_empty() {
            warnings.push(ExtractWarning::new(
                ExtractWarningCode::DocumentTextFallback,
                "no page-level table grid detected; retried with document-level text extraction",
            ));
            rows = fallback_rows;
        }
    }

    if rows.is_empty() {
        warnings.push(ExtractWarning::new(
            ExtractWarningCode::NoTablesDetected,
            "no table rows were detected in the document",
        ));
    }

    RawExtraction { rows, warnings }
}

/// Extracts the grid rows of every page, concatenated in page order.
///
/// Fails with [`ExtractError::TooShort`] when the document has fewer rows
/// than the statement template needs.
pub fn extract_raw_rows(input_pdf: &[u8]) -> Result<RawExtraction, ExtractError> {
    let text = read_pdf_text(input_pdf)?;
    let extraction = rows_from_pages(&text.pages, text.full_text.as_deref());
    ensure_template_rows(&extraction.rows)?;
    Ok(extraction)
}

fn ensure_template_rows(rows: &[Vec<Cell>]) -> Result<(), ExtractError> {
    if rows.len() < StatementLayout::MIN_ROWS {
        return Err(ExtractError::TooShort {
            rows: rows.len(),
            minimum: StatementLayout::MIN_ROWS,
        });
    }
    Ok(())
}

/// Builds and cleans the document table from already extracted rows.
pub fn table_from_rows(
    rows: &[Vec<Cell>],
    warnings: &mut Vec<ExtractWarning>,
) -> Result<DataTable, ExtractError> {
    ensure_template_rows(rows)?;
    Ok(clean_table(build_document_table(rows, warnings)))
}

/// Runs the whole per-document pipeline; failures become [`FileOutcome::Skipped`].
#[must_use]
pub fn convert_document(file_name: &str, input_pdf: &[u8]) -> FileOutcome {
    let result = extract_raw_rows(input_pdf).and_then(|extraction| {
        let mut warnings = extraction.warnings;
        let table = table_from_rows(&extraction.rows, &mut warnings)?;
        Ok((table, warnings))
    });

    match result {
        Ok((table, warnings)) => {
            info!(
                file = file_name,
                rows = table.row_count(),
                columns = table.column_count(),
                warnings = warnings.len(),
                "converted statement"
            );
            for warning in &warnings {
                debug!(file = file_name, %warning, "extraction warning");
            }
            FileOutcome::Converted {
                file_name: file_name.to_string(),
                table,
                warnings,
            }
        }
        Err(error) => {
            warn!(file = file_name, %error, "skipping statement");
            FileOutcome::Skipped {
                file_name: file_name.to_string(),
                error,
            }
        }
    }
}

/// Converts each upload on its own; one bad file never stops the others.
#[must_use]
pub fn convert_batch<'a, I>(uploads: I) -> BatchReport
where
    I: IntoIterator<Item = UploadedFile<'a>>,
{
    let outcomes = uploads
        .into_iter()
        .map(|upload| convert_document(upload.file_name, upload.bytes))
        .collect();
    BatchReport { outcomes }
}
