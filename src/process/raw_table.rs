/// Untyped grid produced by the loader: every sheet of a workbook, rows in
/// sheet order, each cell either text or absent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Builds a table from literal text, treating `""` as an absent cell.
    pub fn from_text(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Appends the rows of another sheet below the current ones.
    pub fn append(&mut self, other: RawTable) {
        self.rows.extend(other.rows);
    }
}
