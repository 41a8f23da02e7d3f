//! Re-joins logical records that a spreadsheet saved as several physical rows.
//!
//! Wrapped cell text is often stored as an extra row whose first column is
//! blank. A new record always has its identifying first column filled in, so
//! the merge runs as a two-state fold over the rows:
//!
//! * a row with a non-blank first cell starts a new record;
//! * a fully blank row is dropped;
//! * a sparse row (at most `max_fragment_cells` values) is appended onto the
//!   buffered record, column by column;
//! * anything else starts a new record.
//!
//! A sparse record with no first cell is therefore always absorbed into the
//! record above it.

use crate::process::table::Table;
use crate::process::utils::is_blank;

#[derive(Debug, Default)]
enum State {
    #[default]
    NoBuffer,
    Buffering(Vec<String>),
}

struct Reconciler {
    max_fragment_cells: usize,
    state: State,
    out: Vec<Vec<String>>,
}

impl Reconciler {
    fn new(max_fragment_cells: usize) -> Self {
        Self {
            max_fragment_cells,
            state: State::NoBuffer,
            out: Vec::new(),
        }
    }

    fn step(&mut self, row: Vec<String>) {
        let first_cell_nonempty = row.first().is_some_and(|c| !is_blank(c));
        let nonempty_count = row.iter().filter(|c| !is_blank(c)).count();

        let state = std::mem::take(&mut self.state);
        self.state = if first_cell_nonempty {
            self.flush(state);
            State::Buffering(row)
        } else if nonempty_count == 0 {
            state
        } else {
            match state {
                State::Buffering(mut record) if nonempty_count <= self.max_fragment_cells => {
                    append_fragment(&mut record, &row);
                    State::Buffering(record)
                }
                other => {
                    self.flush(other);
                    State::Buffering(row)
                }
            }
        };
    }

    fn flush(&mut self, state: State) {
        if let State::Buffering(record) = state {
            self.out.push(record);
        }
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        let state = std::mem::take(&mut self.state);
        self.flush(state);
        self.out
    }
}

fn append_fragment(record: &mut Vec<String>, fragment: &[String]) {
    if record.len() < fragment.len() {
        record.resize(fragment.len(), String::new());
    }
    for (slot, cell) in record.iter_mut().zip(fragment) {
        let cell = cell.trim();
        if !cell.is_empty() {
            *slot = format!("{} {}", slot, cell).trim().to_string();
        }
    }
}

/// Merge continuation fragments in `rows` into the records they belong to.
pub fn reconcile(
    rows: impl IntoIterator<Item = Vec<String>>,
    max_fragment_cells: usize,
) -> Vec<Vec<String>> {
    let mut r = Reconciler::new(max_fragment_cells);
    for row in rows {
        r.step(row);
    }
    r.finish()
}

/// [`reconcile`] over a table's rows; the schema is unchanged.
pub fn reconcile_table(table: Table, max_fragment_cells: usize) -> Table {
    let Table { columns, rows } = table;
    let rows = reconcile(rows, max_fragment_cells);
    Table::new(columns, rows)
}
