use std::collections::BTreeMap;

use crate::model::Cell;

fn push_cell(cells: &mut Vec<String>, words: &mut Vec<&str>) {
    if !words.is_empty() {
        cells.push(words.join(" "));
        words.clear();
    }
}

/// Splits a text line on tabs and on runs of two or more spaces.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut words = Vec::new();
    for segment in line.split('\t') {
        // An empty piece between two separators marks a whitespace run.
        for word in segment.trim().split(char::is_whitespace) {
            if word.is_empty() {
                push_cell(&mut cells, &mut words);
            } else {
                words.push(word);
            }
        }
        push_cell(&mut cells, &mut words);
    }
    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

/// Amount-like token: digits with optional separators, sign and decimals.
pub(crate) fn looks_numeric(value: &str) -> bool {
    let core = value
        .trim()
        .trim_start_matches(['-', '+', '('])
        .trim_end_matches([')', '-']);
    let mut has_digit = false;
    for ch in core.chars() {
        match ch {
            '0'..='9' => has_digit = true,
            ',' | '.' | '/' => {}
            _ => return false,
        }
    }
    has_digit
}

/// Turns text rows into grid rows of equal width, padding with nulls.
pub(crate) fn pad_rows(rows: Vec<Vec<String>>, width: usize) -> Vec<Vec<Cell>> {
    rows.into_iter()
        .map(|row| {
            let filled = row.len().min(width);
            row.into_iter()
                .take(width)
                .map(Some)
                .chain(std::iter::repeat_n(None, width - filled))
                .collect()
        })
        .collect()
}

/// Most common row width; ties go to the wider one.
pub(crate) fn modal_width(rows: &[Vec<String>]) -> usize {
    let histogram = rows.iter().fold(BTreeMap::new(), |mut histogram, row| {
        *histogram.entry(row.len()).or_insert(0_usize) += 1;
        histogram
    });
    histogram
        .into_iter()
        .max_by_key(|&(width, seen)| (seen, width))
        .map_or(0, |(width, _)| width)
}

#[cfg(test)]
mod tests {
    use super::{
        looks_numeric, modal_width, pad_rows, soft_split_line_into_cells, split_line_into_cells,
    };

    #[test]
    fn splits_on_space_runs_only() {
        let cells = split_line_into_cells("01/02/2024  Opening balance  F 120.00");
        assert_eq!(cells, vec!["01/02/2024", "Opening balance", "F 120.00"]);
    }

    #[test]
    fn tabs_always_separate_cells() {
        let cells = split_line_into_cells("ARN\tX-100\tDATE\t2024-01-31");
        assert_eq!(cells, vec!["ARN", "X-100", "DATE", "2024-01-31"]);
    }

    #[test]
    fn soft_split_breaks_every_space() {
        let cells = soft_split_line_into_cells("Date Amount Balance");
        assert_eq!(cells, vec!["Date", "Amount", "Balance"]);
    }

    #[test]
    fn recognises_amount_tokens() {
        assert!(looks_numeric("1,234.50"));
        assert!(looks_numeric("(12.00)"));
        assert!(looks_numeric("31/01/2024"));
        assert!(!looks_numeric("A123"));
        assert!(!looks_numeric("-"));
    }

    #[test]
    fn pads_ragged_rows_with_nulls() {
        let rows = vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
        ];
        let padded = pad_rows(rows, 3);
        assert_eq!(padded[0], vec![Some("a".to_string()), None, None]);
        assert_eq!(
            padded[1],
            vec![Some("b".to_string()), Some("c".to_string()), None]
        );
    }

    #[test]
    fn modal_width_prefers_common_then_wider() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
            vec!["x".to_string()],
        ];
        assert_eq!(modal_width(&rows), 2);
        assert_eq!(modal_width(&rows[1..]), 2);
        assert_eq!(modal_width(&[]), 0);
    }
}
