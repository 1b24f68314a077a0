use std::sync::OnceLock;

use regex::Regex;

use crate::layout::StatementLayout;
use crate::model::{Cell, DataTable};

fn spaced_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[FLA]\s+").expect("valid spaced prefix regex"))
}

fn glued_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[FLA](\d+(\.\d+)?|\.\d+)$").expect("valid glued amount regex")
    })
}

fn strip_status_prefix(text: &str) -> Option<&str> {
    if let Some(found) = spaced_prefix_re().find(text) {
        return Some(&text[found.end()..]);
    }
    if glued_amount_re().is_match(text) {
        return Some(&text[1..]);
    }
    None
}

/// Normalizes one cell: drops line breaks, trims, and removes the F/L/A status prefix.
///
/// The prefix is stripped until none is left, so cleaning an already clean
/// cell never changes it.
#[must_use]
pub fn clean_cell(cell: Cell) -> Cell {
    let text = cell?;
    let mut text = text.replace('\n', "").trim().to_string();
    while let Some(rest) = strip_status_prefix(&text) {
        text = rest.to_string();
    }
    Some(text)
}

/// Drops columns whose non-null count does not exceed a tenth of the row count.
#[must_use]
pub fn prune_sparse_columns(table: &DataTable) -> DataTable {
    let threshold = StatementLayout::sparse_column_threshold(table.row_count());
    let keep = (0..table.column_count())
        .filter(|&index| table.column(index).filter(|cell| cell.is_some()).count() > threshold)
        .collect::<Vec<_>>();
    table.select_columns(&keep)
}

/// Drops every column after the last one holding a non-empty cell.
///
/// A table with no such column is returned as is.
#[must_use]
pub fn trim_trailing_empty_columns(table: &DataTable) -> DataTable {
    let last_filled = (0..table.column_count()).rev().find(|&index| {
        table
            .column(index)
            .any(|cell| cell.as_deref().is_some_and(|value| !value.is_empty()))
    });

    match last_filled {
        Some(last) => table.select_columns(&(0..=last).collect::<Vec<_>>()),
        None => table.clone(),
    }
}

/// Cleans every cell, then prunes sparse and trailing empty columns.
#[must_use]
pub fn clean_table(mut table: DataTable) -> DataTable {
    table.map_cells(clean_cell);
    let pruned = prune_sparse_columns(&table);
    trim_trailing_empty_columns(&pruned)
}
