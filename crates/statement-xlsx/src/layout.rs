//! Row and column offsets of the statement template.
//!
//! The template is fixed: rows 0..=6 carry the metadata block, row 7 is the
//! table header and everything after it is table body.

use std::ops::Range;

/// Fixed positions used by the frame builder and the column cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementLayout;

impl StatementLayout {
    /// Row holding the column names of the statement table.
    pub const HEADER_ROW: usize = 7;
    /// First body row.
    pub const BODY_START: usize = Self::HEADER_ROW + 1;
    /// A document needs the metadata block plus the header row.
    pub const MIN_ROWS: usize = Self::HEADER_ROW + 1;

    /// Rows scanned for key/value metadata.
    pub const METADATA_ROWS: Range<usize> = 0..7;
    pub const METADATA_KEY_COL: usize = 1;
    pub const METADATA_VALUE_COL: usize = 7;
    /// Metadata values that are treated as absent.
    pub const METADATA_EMPTY_VALUES: [&'static str; 4] = ["", "none", "0", "0.00"];

    /// Rows scanned for the ARN and DATE labels.
    pub const REFERENCE_ROWS: Range<usize> = 0..6;
    pub const ARN_LABEL: &'static str = "arn";
    pub const DATE_LABEL: &'static str = "date";
    pub const ARN_COLUMN: &'static str = "ARN";
    pub const DATE_COLUMN: &'static str = "DATE";

    /// Share of non-null cells, in percent, a column must exceed to survive pruning.
    pub const MIN_FILLED_PERCENT: usize = 10;

    /// Largest non-null count that still gets a column pruned.
    #[must_use]
    pub const fn sparse_column_threshold(row_count: usize) -> usize {
        row_count * Self::MIN_FILLED_PERCENT / 100
    }
}

#[cfg(test)]
mod tests {
    use super::StatementLayout;

    #[test]
    fn header_sits_after_metadata_block() {
        assert_eq!(StatementLayout::METADATA_ROWS.end, StatementLayout::HEADER_ROW);
        assert_eq!(StatementLayout::MIN_ROWS, 8);
    }

    #[test]
    fn sparse_threshold_truncates() {
        assert_eq!(StatementLayout::sparse_column_threshold(0), 0);
        assert_eq!(StatementLayout::sparse_column_threshold(9), 0);
        assert_eq!(StatementLayout::sparse_column_threshold(10), 1);
        assert_eq!(StatementLayout::sparse_column_threshold(20), 2);
        assert_eq!(StatementLayout::sparse_column_threshold(25), 2);
    }
}
