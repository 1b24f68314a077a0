use std::collections::HashMap;

use crate::model::DataTable;

/// Pairs every column with how many earlier columns share its name.
fn occurrence_keys(columns: &[String]) -> Vec<(&str, usize)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    columns
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            let key = (name.as_str(), *count);
            *count += 1;
            key
        })
        .collect()
}

/// Stacks tables row-wise, aligning columns by name.
///
/// The result's columns are the union in first-seen order; cells a table
/// does not have are null. A name repeated inside one table lines up with
/// the same repetition in the others.
#[must_use]
pub fn combine_tables(tables: &[DataTable]) -> DataTable {
    let mut union: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<(String, usize), usize> = HashMap::new();

    for table in tables {
        for (name, occurrence) in occurrence_keys(&table.columns) {
            let key = (name.to_string(), occurrence);
            if !positions.contains_key(&key) {
                positions.insert(key.clone(), union.len());
                union.push(key);
            }
        }
    }

    let width = union.len();
    let mut rows = Vec::with_capacity(tables.iter().map(DataTable::row_count).sum());
    for table in tables {
        let targets = occurrence_keys(&table.columns)
            .into_iter()
            .map(|(name, occurrence)| positions[&(name.to_string(), occurrence)])
            .collect::<Vec<_>>();

        for row in &table.rows {
            let mut out = vec![None; width];
            for (cell, &target) in row.iter().zip(&targets) {
                out[target].clone_from(cell);
            }
            rows.push(out);
        }
    }

    DataTable {
        columns: union.into_iter().map(|(name, _)| name).collect(),
        rows,
    }
}
