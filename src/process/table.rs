/// Schema-consistent table: unique column names and rows of exactly one
/// value per column.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// No records. A table with columns but no rows is still empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in record `row`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx)).map(String::as_str)
    }

    /// Keep only the columns whose index satisfies `keep`.
    pub(crate) fn retain_columns(&mut self, keep: &[bool]) {
        fn project<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
            items
                .into_iter()
                .zip(keep)
                .filter_map(|(item, &k)| k.then_some(item))
                .collect()
        }
        self.columns = project(std::mem::take(&mut self.columns), keep);
        self.rows = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| project(row, keep))
            .collect();
    }
}
