#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

/// A single grid cell. `None` is an empty (null) cell.
pub type Cell = Option<String>;

/// Rows of one document in page order, before any header is applied.
pub type RawRows = Vec<Vec<Cell>>;

/// A table with named columns. Every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Sets `name` to `value` on every row, overwriting columns that already carry the name.
    pub fn set_constant_column(&mut self, name: &str, value: Cell) {
        let existing = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| *column == name)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        if existing.is_empty() {
            self.columns.push(name.to_string());
            for row in &mut self.rows {
                row.push(value.clone());
            }
            return;
        }

        for row in &mut self.rows {
            for &index in &existing {
                row[index] = value.clone();
            }
        }
    }

    #[must_use]
    pub fn select_columns(&self, keep: &[usize]) -> Self {
        let columns = keep
            .iter()
            .map(|&index| self.columns[index].clone())
            .collect::<Vec<_>>();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&index| row[index].clone()).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn map_cells(&mut self, mut f: impl FnMut(Cell) -> Cell) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                *cell = f(cell.take());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataTable;

    fn cell(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn pads_short_rows_on_construction() {
        let table = DataTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![cell("1")]],
        );
        assert_eq!(table.rows[0], vec![cell("1"), None]);
    }

    #[test]
    fn constant_column_appends_then_overwrites() {
        let mut table = DataTable::new(vec!["a".to_string()], vec![vec![cell("1")], vec![None]]);
        table.set_constant_column("ARN", cell("X"));
        assert_eq!(table.columns, vec!["a", "ARN"]);
        assert_eq!(table.rows[1], vec![None, cell("X")]);

        table.set_constant_column("ARN", cell("Y"));
        assert_eq!(table.column_count(), 2);
        assert!(table.column(1).all(|value| value.as_deref() == Some("Y")));
    }
}
