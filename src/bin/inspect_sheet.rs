use rosterscan::config::Config;
use rosterscan::diagnostics::MemorySink;
use rosterscan::load::Loader;
use rosterscan::process::{
    continuation::reconcile_table, locate_header, normalize::normalize,
    typing::coerce_date_columns, HeaderSearch, RawTable,
};
use std::{env, path::Path, process::exit};

fn main() {
    // Expect one CLI argument: the workbook; an optional second caps printed raw rows.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <WORKBOOK> [RAW_ROWS]", args[0]);
        exit(1);
    }
    let raw_rows = args
        .get(2)
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(25);
    if let Err(e) = inspect_sheet(Path::new(&args[1]), raw_rows) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Walk one workbook through every stage and print what each one decided.
fn inspect_sheet(path: &Path, raw_rows: usize) -> anyhow::Result<()> {
    let cfg = Config::default();
    let sink = MemorySink::new();

    // 1) Raw grid as the engines see it
    let raw = Loader::new(&sink).load(path);
    println!("=== Workbook: {} ===", path.display());
    for line in sink.lines() {
        println!("  log: {}", line);
    }
    println!("Raw rows: {}  width: {}", raw.len(), raw.width());
    print_raw(&raw, raw_rows);
    if raw.is_empty() {
        return Ok(());
    }

    // 2) Header decision
    let header = locate_header(&raw, &cfg.header_keywords, cfg.sample_rows);
    println!();
    match header {
        HeaderSearch::Found(i) => println!("=== Header: row {} ===", i),
        HeaderSearch::Unassigned => println!("=== Header: none assigned (keywords scattered) ==="),
        HeaderSearch::NotATable => {
            println!("=== Header: not a data table ===");
            return Ok(());
        }
    }

    // 3) Normalized, merged and typed table
    let table = normalize(raw, header.index(), &cfg.decorative_markers)?;
    let before = table.len();
    let mut table = reconcile_table(table, cfg.max_fragment_cells);
    let date_cols = coerce_date_columns(&mut table, &cfg.date_keyword);
    println!(
        "Rows after filtering: {}  after merging: {}  date columns: {}",
        before,
        table.len(),
        date_cols
    );
    println!();
    println!("{}", table.columns.join(" | "));
    for row in &table.rows {
        println!("{}", row.join(" | "));
    }
    Ok(())
}

fn print_raw(raw: &RawTable, limit: usize) {
    for (i, row) in raw.rows.iter().take(limit).enumerate() {
        let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("·")).collect();
        println!("{:>4}: {}", i, cells.join(" | "));
    }
    if raw.len() > limit {
        println!("  … {} more rows", raw.len() - limit);
    }
}
