use tracing::debug;

use crate::model::{Cell, DetectedTable, PageText};
use crate::table_parse::{
    looks_numeric, modal_width, pad_rows, soft_split_line_into_cells, split_line_into_cells,
};
use crate::warning::{ExtractWarning, WarningCode};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Fewest cells a text line needs to count as a table row.
pub(crate) const MIN_COLS: usize = 2;

/// Fewest consecutive rows that make a table block.
const MIN_BLOCK_ROWS: usize = 2;

/// Blend of how many rows share the modal width and how far widths spread.
#[allow(clippy::cast_precision_loss)]
fn table_confidence(rows: &[Vec<String>]) -> f32 {
    let modal = modal_width(rows);
    if rows.len() < MIN_BLOCK_ROWS || modal == 0 {
        return 0.0;
    }

    let widths = rows.iter().map(Vec::len);
    let (narrowest, widest) = widths
        .clone()
        .fold((usize::MAX, 0), |(lo, hi), width| (lo.min(width), hi.max(width)));
    let on_modal = widths.filter(|&width| width == modal).count() as f32 / rows.len() as f32;
    let spread = (widest - narrowest) as f32 / widest as f32;

    (0.75 * on_modal + 0.25 * (1.0 - spread)).clamp(0.0, 1.0)
}

fn is_sentence(line: &str) -> bool {
    line.trim_end().ends_with(['.', '!', '?'])
}

fn line_cells(line: &str) -> Vec<String> {
    let cells = split_line_into_cells(line);
    if cells.len() >= MIN_COLS || is_sentence(line) {
        return cells;
    }

    // Statement lines such as "01/02 Fee 1.50" only use single spaces.
    let words = soft_split_line_into_cells(line);
    if words.len() >= MIN_COLS && words.iter().any(|word| looks_numeric(word)) {
        words
    } else {
        cells
    }
}

/// Consecutive multi-cell lines of one page.
struct BlockBuilder {
    page: u32,
    rows: Vec<Vec<String>>,
    finished: Vec<DetectedTable>,
}

impl BlockBuilder {
    fn new(page: u32) -> Self {
        Self {
            page,
            rows: Vec::new(),
            finished: Vec::new(),
        }
    }

    fn close_block(&mut self) {
        let rows = std::mem::take(&mut self.rows);
        if rows.len() >= MIN_BLOCK_ROWS {
            self.finished.push(DetectedTable {
                page: self.page,
                confidence: table_confidence(&rows),
                rows,
            });
        }
    }

    fn finish(mut self) -> Vec<DetectedTable> {
        self.close_block();
        self.finished
    }
}

pub(crate) fn detect_tables_in_page(page: &PageText) -> Vec<DetectedTable> {
    let mut builder = BlockBuilder::new(page.page_number);
    for line in page.text.lines().filter(|line| !line.trim().is_empty()) {
        let cells = line_cells(line);
        if cells.len() < MIN_COLS {
            builder.close_block();
        } else {
            builder.rows.push(cells);
        }
    }
    builder.finish()
}

/// Picks the page's largest table, by rows and then by cells.
fn largest_table(tables: Vec<DetectedTable>) -> Option<DetectedTable> {
    tables.into_iter().max_by_key(|table| {
        let cells = table.rows.iter().map(Vec::len).sum::<usize>();
        (table.rows.len(), cells)
    })
}

/// Extracts one grid per page and concatenates the rows in page order.
pub(crate) fn extract_page_grids(
    pages: &[PageText],
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<Vec<Cell>> {
    let mut grid = Vec::new();

    for page in pages {
        let Some(table) = largest_table(detect_tables_in_page(page)) else {
            debug!(page = page.page_number, "no table grid detected on page");
            continue;
        };

        let width = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        debug!(
            page = table.page,
            rows = table.rows.len(),
            width,
            confidence = table.confidence,
            "detected page grid"
        );
        if table.confidence < LOW_CONFIDENCE_THRESHOLD {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::LowConfidence,
                    "table grid has irregular row widths; exported in best-effort mode",
                )
                .with_page(table.page)
                .with_confidence(table.confidence),
            );
        }
        grid.extend(pad_rows(table.rows, width));
    }

    grid
}
