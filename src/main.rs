use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rosterscan::{
    config::Config,
    dataset::{self, BatchSummary, Dataset},
    diagnostics::{problem_files, FileSink},
    discover::discover,
    load::OfficeConverter,
    pipeline::Extractor,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "rosterscan")]
#[command(about = "Collect personnel rosters from a folder of inconsistent spreadsheets")]
struct Args {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory to scan (overrides `base_dir`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Diagnostics log (overrides `log_file`)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Files extracted in parallel; 1 keeps strict sequential order
    #[arg(short, long, global = true, default_value_t = 1)]
    jobs: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every spreadsheet and print the batch summary
    Scan {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find people by (part of) their name
    Search { query: Vec<String> },
    /// List companies and the files that contributed records
    Companies,
    /// Extract a single file and print its table
    Show { file: PathBuf },
    /// List files that failed in the last run, from the diagnostics log
    Errors,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    let args = Args::parse();
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.dir.clone() {
        cfg.base_dir = dir;
    }
    if let Some(log_file) = args.log_file.clone() {
        cfg.log_file = log_file;
    }
    cfg.validate()?;

    let converter = OfficeConverter::new(cfg.converter.program.clone());

    match args.command {
        Command::Errors => print_errors(&cfg),
        Command::Show { file } => show_file(&cfg, &converter, &file),
        Command::Scan { json } => {
            let (dataset, summary) = run_batch(&cfg, &converter, args.jobs)?;
            print_summary(&dataset, &summary, json)
        }
        Command::Search { query } => {
            let (dataset, _) = run_batch(&cfg, &converter, args.jobs)?;
            print_search(&dataset, &query.join(" "));
            Ok(())
        }
        Command::Companies => {
            let (dataset, _) = run_batch(&cfg, &converter, args.jobs)?;
            for (i, (company, files)) in dataset.companies().iter().enumerate() {
                println!("[{}] {}", i + 1, company);
                for f in files {
                    println!("      {}", f);
                }
            }
            Ok(())
        }
    }
}

fn build_extractor<'a>(
    cfg: &'a Config,
    sink: &'a FileSink,
    converter: &'a OfficeConverter,
) -> Extractor<'a> {
    let extractor = Extractor::new(cfg, sink);
    if cfg.converter.enabled {
        extractor.with_converter(converter)
    } else {
        extractor
    }
}

fn run_batch(
    cfg: &Config,
    converter: &OfficeConverter,
    jobs: usize,
) -> Result<(Dataset, BatchSummary)> {
    // ─── 3) fresh diagnostics log for this run ───────────────────────
    let sink = FileSink::create(&cfg.log_file)?;
    let extractor = build_extractor(cfg, &sink, converter);

    // ─── 4) discover ─────────────────────────────────────────────────
    let candidates = discover(&cfg.base_dir, &cfg.extensions)?;
    if candidates.is_empty() {
        bail!("no spreadsheet files found under {}", cfg.base_dir.display());
    }
    info!("{} spreadsheet files found", candidates.len());

    // ─── 5) extract + fold ───────────────────────────────────────────
    let (dataset, summary) = dataset::collect(&extractor, &candidates, jobs.max(1))?;
    eprintln!("parsed:  {}", summary.parsed);
    eprintln!("skipped: {}", summary.skipped);
    eprintln!("total:   {}", summary.total);
    if dataset.is_empty() {
        bail!("no data to analyze: none of the {} files yielded records", summary.total);
    }
    Ok((dataset, summary))
}

fn show_file(cfg: &Config, converter: &OfficeConverter, file: &Path) -> Result<()> {
    let sink = FileSink::append(&cfg.log_file)?;
    let table = build_extractor(cfg, &sink, converter).extract(file);
    if table.is_empty() {
        bail!("no data extracted from {}", file.display());
    }
    println!("{}", table.columns.join("\t"));
    for row in &table.rows {
        println!("{}", row.join("\t"));
    }
    Ok(())
}

fn print_summary(dataset: &Dataset, summary: &BatchSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("records:   {}", dataset.len());
    println!("companies: {}", dataset.companies().len());
    println!("columns:   {}", dataset.columns().join(", "));
    Ok(())
}

fn print_search(dataset: &Dataset, query: &str) {
    let hits = dataset.search(query);
    if hits.is_empty() {
        println!("no matches for {:?}", query);
        return;
    }
    println!("{} matches", hits.len());
    for r in hits {
        println!("{} | {} | {}", r.fio, r.company, r.file);
    }
}

fn print_errors(cfg: &Config) -> Result<()> {
    if !cfg.log_file.exists() {
        println!("no diagnostics log at {}", cfg.log_file.display());
        return Ok(());
    }
    let text = fs::read_to_string(&cfg.log_file)
        .with_context(|| format!("reading {:?}", cfg.log_file))?;
    let problems = problem_files(&text);
    if problems.is_empty() {
        println!("all files were read successfully");
        return Ok(());
    }
    println!("{} problem files", problems.len());
    for p in problems {
        println!("{} | {}", p.company, p.path);
    }
    Ok(())
}
