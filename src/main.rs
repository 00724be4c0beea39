//! SciPAn CLI - weekly arXiv digest
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use chrono::Local;
use clap::Parser;
use colored::Colorize;
use scipan::config::Overrides;
use scipan::{run, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scipan")]
#[command(author, version, about = "Weekly arXiv digest with optional LLM summaries", long_about = None)]
struct Cli {
    /// Path to a scipan.toml file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_overrides(&cli.overrides);

    let report = run::run(&config, Local::now().date_naive()).await?;

    // Without a key every summary is a fallback; only failed requests are worth flagging
    if config.api_key().is_some() && report.digest.fallbacks > 0 {
        eprintln!(
            "{} {} of {} summaries used the extractive fallback",
            "warning:".yellow().bold(),
            report.digest.fallbacks,
            report.digest.papers
        );
    }

    println!("Digest saved to {}", report.path.display());
    Ok(())
}

fn setup_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("scipan=debug")
        } else {
            EnvFilter::new("scipan=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
