use crate::process::date_parser::canonical_date;
use crate::process::table::Table;
use tracing::debug;

/// Rewrite every column whose name contains `date_keyword` (case-insensitive)
/// as ISO dates. Unparseable cells become empty; nothing here can fail.
///
/// Returns the number of date columns touched.
pub fn coerce_date_columns(table: &mut Table, date_keyword: &str) -> usize {
    let keyword = date_keyword.to_lowercase();
    if keyword.is_empty() {
        return 0;
    }
    let date_columns: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_lowercase().contains(&keyword))
        .map(|(i, _)| i)
        .collect();

    for &col in &date_columns {
        let mut blanked = 0usize;
        for row in table.rows.iter_mut() {
            let cell = &mut row[col];
            let coerced = canonical_date(cell);
            if coerced.is_empty() && !cell.is_empty() {
                blanked += 1;
            }
            *cell = coerced;
        }
        if blanked > 0 {
            debug!(column = %table.columns[col], blanked, "unparseable dates cleared");
        }
    }
    date_columns.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["ФИО".into(), "Дата приема".into(), "Стаж".into()],
            vec![
                vec!["Иванов".into(), "15.01.2024".into(), "01.01.2000".into()],
                vec!["Петров".into(), "—".into(), "3 года".into()],
                vec!["Сидоров".into(), "2023-11-02 00:00:00".into(), "".into()],
            ],
        )
    }

    #[test]
    fn only_date_columns_are_coerced() {
        let mut t = table();
        assert_eq!(coerce_date_columns(&mut t, "дата"), 1);
        assert_eq!(t.get(0, "Дата приема"), Some("2024-01-15"));
        assert_eq!(t.get(0, "Стаж"), Some("01.01.2000"));
    }

    #[test]
    fn unparseable_cell_is_blanked_and_rest_continue() {
        let mut t = table();
        coerce_date_columns(&mut t, "дата");
        assert_eq!(t.get(1, "Дата приема"), Some(""));
        assert_eq!(t.get(2, "Дата приема"), Some("2023-11-02"));
        assert_eq!(t.get(1, "ФИО"), Some("Петров"));
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut t = table();
        coerce_date_columns(&mut t, "дата");
        let once = t.clone();
        coerce_date_columns(&mut t, "ДАТА");
        assert_eq!(t, once);
    }
}
