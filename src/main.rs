use anyhow::Result;
use clap::Parser;
use std::{io, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use trendscope::{
    config::{load_config, AppConfig},
    walkthrough::{challenge_steps, run_steps, AutoConfirm, Confirm, Session, StdinConfirm},
};

#[derive(Parser, Debug)]
#[command(name = "trendscope")]
#[command(about = "Step-by-step comparison of Google search trends with prices and rates")]
struct Args {
    /// YAML config file; every setting has a default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the input CSV files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where chart SVGs are written
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Run every step without waiting for ENTER
    #[arg(short, long)]
    yes: bool,

    /// Also write the tables to Parquet at the end
    #[arg(long)]
    export: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    // ─── 2) config, CLI overrides on top ─────────────────────────────
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    config.export_parquet |= args.export;
    info!(
        data = %config.data_dir.display(),
        charts = %config.output_dir.display(),
        window = config.rolling_window,
        export = config.export_parquet,
        "configured"
    );

    // ─── 3) load tables ──────────────────────────────────────────────
    let steps = challenge_steps(&config);
    let mut session = Session::load(config, io::stdout())?;

    // ─── 4) run the walkthrough ──────────────────────────────────────
    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirm::new(io::stdin().lock(), io::stdout()))
    };
    let mut out = io::stdout();
    run_steps(&mut session, steps, confirm.as_mut(), &mut out)?;

    info!(charts = session.charts.len(), "done");
    Ok(())
}
