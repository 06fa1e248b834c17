use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use trendscope::{
    load::load_table,
    process::{
        dates::{date_coverage, normalize_dates},
        quality::{column_table, describe, shape},
    },
};

#[derive(Parser)]
#[command(name = "inspect-csv")]
#[command(about = "Print shape, column types, missing values and summary statistics of a CSV")]
struct Args {
    /// CSV file to inspect
    file: PathBuf,

    /// Column holding dates; enables date parsing and order checks
    #[arg(short, long)]
    date_column: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("trendscope={},inspect_csv={}", log_level, log_level))
        .with_writer(std::io::stderr)
        .init();

    let ds = load_table(&args.file, args.date_column.as_deref())?;
    info!(name = %ds.name, "loaded");

    let (rows, cols) = shape(&ds);
    println!("{}: {} rows × {} columns", ds.name, rows, cols);
    println!();
    print!("{}", column_table(&ds));
    println!();
    print!("{}", describe(&ds));

    if args.date_column.is_some() {
        let ds = normalize_dates(&ds)?;
        println!();
        print!("{}", date_coverage(&ds)?);
    }
    Ok(())
}
