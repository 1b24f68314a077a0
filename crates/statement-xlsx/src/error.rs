use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to extract PDF text: {0}")]
    PdfExtract(String),

    #[error("PDF table too short: found {rows} row(s), need at least {minimum}")]
    TooShort { rows: usize, minimum: usize },

    #[error("spreadsheet write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("PDF has no pages")]
    NoPages,
}

impl ExtractError {
    /// Whether the document was readable but does not follow the statement template.
    #[must_use]
    pub fn is_too_short(&self) -> bool {
        matches!(self, Self::TooShort { .. })
    }
}
