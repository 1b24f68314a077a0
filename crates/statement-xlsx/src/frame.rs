//! Builds a document table from raw grid rows using the fixed statement template.

use tracing::debug;

use crate::layout::StatementLayout;
use crate::model::{Cell, DataTable};
use crate::warning::{ExtractWarning, WarningCode};

/// Reference fields found in the leading rows of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFields {
    pub arn: String,
    pub date: String,
}

fn non_empty(cell: Option<&Cell>) -> Option<&str> {
    cell.and_then(Option::as_deref).filter(|value| !value.is_empty())
}

/// Reads `(key, value)` pairs from the metadata block.
///
/// A row contributes when it is wide enough and both the key and the value
/// cell carry text. Values that read as zero or "none" are left out. A key
/// that is blank after trimming is skipped rather than becoming a column
/// with an empty name.
#[must_use]
pub fn scan_metadata(rows: &[Vec<Cell>]) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    for row in rows.iter().take(StatementLayout::METADATA_ROWS.end) {
        if row.len() <= StatementLayout::METADATA_VALUE_COL {
            continue;
        }
        let (Some(key), Some(value)) = (
            non_empty(row.get(StatementLayout::METADATA_KEY_COL)),
            non_empty(row.get(StatementLayout::METADATA_VALUE_COL)),
        ) else {
            continue;
        };

        let key = key.trim();
        let value = value.trim();
        if key.is_empty()
            || StatementLayout::METADATA_EMPTY_VALUES.contains(&value.to_lowercase().as_str())
        {
            continue;
        }
        entries.push((key.to_string(), value.to_string()));
    }

    entries
}

fn value_after_label(row: &[Cell], lowered: &[String], label: &str) -> Option<String> {
    let index = lowered.iter().position(|cell| cell == label)?;
    Some(
        row.get(index + 1)
            .cloned()
            .flatten()
            .unwrap_or_default(),
    )
}

/// Finds the ARN and DATE values next to their labels.
///
/// Every row of the window is scanned; a later match replaces an earlier one.
#[must_use]
pub fn scan_reference_fields(rows: &[Vec<Cell>]) -> ReferenceFields {
    let mut fields = ReferenceFields::default();

    for row in rows.iter().take(StatementLayout::REFERENCE_ROWS.end) {
        let lowered = row
            .iter()
            .map(|cell| cell.as_deref().unwrap_or_default().to_lowercase())
            .collect::<Vec<_>>();

        if let Some(arn) = value_after_label(row, &lowered, StatementLayout::ARN_LABEL) {
            fields.arn = arn;
        }
        if let Some(date) = value_after_label(row, &lowered, StatementLayout::DATE_LABEL) {
            fields.date = date;
        }
    }

    fields
}

/// Slices the header and body out of `rows` and attaches the metadata columns.
///
/// Callers guarantee `rows` reaches past the header row. Body rows longer than
/// the header are truncated and reported as [`WarningCode::RaggedRow`].
#[must_use]
pub fn build_document_table(
    rows: &[Vec<Cell>],
    warnings: &mut Vec<ExtractWarning>,
) -> DataTable {
    let columns = rows
        .get(StatementLayout::HEADER_ROW)
        .map(|header| {
            header
                .iter()
                .map(|cell| cell.as_deref().unwrap_or_default().trim().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let width = columns.len();

    let mut body = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(StatementLayout::BODY_START) {
        let mut row = row.clone();
        if row.len() > width {
            let dropped = row.split_off(width);
            if dropped.iter().any(Option::is_some) {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::RaggedRow,
                        format!(
                            "row has {} cell(s) but the header has {width}; extra cells dropped",
                            width + dropped.len()
                        ),
                    )
                    .with_row(index),
                );
            }
        }
        body.push(row);
    }

    let mut table = DataTable::new(columns, body);

    for (key, value) in scan_metadata(rows) {
        debug!(key = %key, value = %value, "attaching metadata column");
        table.set_constant_column(&key, Some(value));
    }

    let fields = scan_reference_fields(rows);
    table.set_constant_column(StatementLayout::ARN_COLUMN, Some(fields.arn));
    table.set_constant_column(StatementLayout::DATE_COLUMN, Some(fields.date));

    table
}

#[cfg(test)]
mod tests {
    use super::{ReferenceFields, build_document_table, scan_metadata, scan_reference_fields};
    use crate::warning::WarningCode;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells
            .iter()
            .map(|cell| {
                if *cell == "<null>" {
                    None
                } else {
                    Some((*cell).to_string())
                }
            })
            .collect()
    }

    fn template(
        metadata: Vec<Vec<Option<String>>>,
        body: Vec<Vec<Option<String>>>,
    ) -> Vec<Vec<Option<String>>> {
        let mut rows = metadata;
        rows.resize(7, row(&["meta"]));
        rows.push(row(&["Date", "Description", "Amount"]));
        rows.extend(body);
        rows
    }

    #[test]
    fn nine_row_grid_yields_single_body_row() {
        let rows = template(Vec::new(), vec![row(&["01/01", "Fee", "F 1.00"])]);
        let mut warnings = Vec::new();
        let table = build_document_table(&rows, &mut warnings);

        assert_eq!(table.columns, vec!["Date", "Description", "Amount", "ARN", "DATE"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][2].as_deref(), Some("F 1.00"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn metadata_row_adds_constant_column() {
        let rows = template(
            vec![
                row(&["x"]),
                row(&["x"]),
                row(&["", "RefKey", "", "", "", "", "", "42"]),
            ],
            vec![row(&["01/01", "Fee", "1.00"]), row(&["02/01", "Tax", "2.00"])],
        );
        let table = build_document_table(&rows, &mut Vec::new());

        let index = table.column_index("RefKey").expect("metadata column");
        assert!(table.column(index).all(|cell| cell.as_deref() == Some("42")));
    }

    #[test]
    fn metadata_skips_sentinels_blank_keys_and_short_rows() {
        let rows = vec![
            row(&["", "Zero", "", "", "", "", "", "0.00"]),
            row(&["", "Nothing", "", "", "", "", "", " None "]),
            row(&["", "Missing", "", "", "", "", "", "<null>"]),
            row(&["", "Blank", "", "", "", "", "", ""]),
            row(&["", "Short", "", "", "", "", "5"]),
            row(&["", "   ", "", "", "", "", "", "7"]),
            row(&["", " Limit ", "", "", "", "", "", " 1,000 "]),
        ];
        assert_eq!(
            scan_metadata(&rows),
            vec![("Limit".to_string(), "1,000".to_string())]
        );
    }

    #[test]
    fn metadata_ignores_rows_past_the_block() {
        let mut rows = vec![row(&["x"]); 7];
        rows.push(row(&["", "Late", "", "", "", "", "", "9"]));
        assert!(scan_metadata(&rows).is_empty());
    }

    #[test]
    fn arn_label_takes_following_cell() {
        let rows = template(
            vec![
                row(&["a"]),
                row(&["b"]),
                row(&["c"]),
                row(&["", "", "", "ARN", "X-100"]),
            ],
            vec![row(&["01/01", "Fee", "1.00"])],
        );
        let table = build_document_table(&rows, &mut Vec::new());

        let index = table.column_index("ARN").expect("ARN column");
        assert_eq!(table.rows[0][index].as_deref(), Some("X-100"));
        assert_eq!(
            scan_reference_fields(&rows),
            ReferenceFields {
                arn: "X-100".to_string(),
                date: String::new(),
            }
        );
    }

    #[test]
    fn reference_scan_keeps_last_match_and_ignores_row_six() {
        let rows = vec![
            row(&["Date", "2024-01-01", "arn", "FIRST"]),
            row(&["DATE", "2024-02-01"]),
            row(&["ARN"]),
            row(&["x"]),
            row(&["x"]),
            row(&["x"]),
            row(&["ARN", "TOO-LATE"]),
        ];
        assert_eq!(
            scan_reference_fields(&rows),
            ReferenceFields {
                arn: String::new(),
                date: "2024-02-01".to_string(),
            }
        );
    }

    #[test]
    fn reference_label_followed_by_null_reads_empty() {
        let rows = vec![row(&["ARN", "<null>", "X"])];
        assert_eq!(scan_reference_fields(&rows).arn, "");
    }

    #[test]
    fn ragged_rows_are_padded_or_truncated_with_warning() {
        let rows = template(
            Vec::new(),
            vec![
                row(&["01/01"]),
                row(&["02/01", "Fee", "1.00", "stray"]),
            ],
        );
        let mut warnings = Vec::new();
        let table = build_document_table(&rows, &mut warnings);

        assert_eq!(table.rows[0][1], None);
        assert_eq!(table.rows[1][2].as_deref(), Some("1.00"));
        assert_eq!(table.rows[1].len(), table.column_count());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::RaggedRow);
        assert_eq!(warnings[0].row, Some(9));
    }

    #[test]
    fn metadata_key_matching_reference_column_is_replaced() {
        let rows = template(
            vec![
                row(&["", "ARN", "", "", "", "", "", "META"]),
                row(&["ARN", "REAL"]),
            ],
            vec![row(&["01/01", "Fee", "1.00"])],
        );
        let table = build_document_table(&rows, &mut Vec::new());

        assert_eq!(
            table.columns.iter().filter(|column| *column == "ARN").count(),
            1
        );
        let index = table.column_index("ARN").expect("ARN column");
        assert_eq!(table.rows[0][index].as_deref(), Some("REAL"));
    }
}
