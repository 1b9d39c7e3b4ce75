//! Cert-Sieve main entry point
//!
//! This is the command-line interface for the Cert-Sieve contact harvester.

use anyhow::Context;
use cert_sieve::config::{load_config, Config};
use cert_sieve::{AnalysisRequest, Analyzer};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cert-Sieve: contact emails from certificate documents
///
/// Cert-Sieve fetches each URL, decodes the PDF, image or landing page behind
/// it, and prints one JSON result per URL with the email addresses found.
#[derive(Parser, Debug)]
#[command(name = "cert-sieve")]
#[command(version)]
#[command(about = "Harvest contact emails from certificate documents", long_about = None)]
struct Cli {
    /// URLs to analyze
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the data directory for stored assets
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Display name for the results
    #[arg(long)]
    name: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    let analyzer = Analyzer::new(&config).context("Failed to initialize analyzer")?;

    let requests = cli
        .urls
        .iter()
        .map(|url| {
            let request = AnalysisRequest::new(url.as_str());
            match &cli.name {
                Some(name) => request.with_name(name.as_str()),
                None => request,
            }
        })
        .collect();

    let results = analyzer
        .analyze_all(requests, config.batch.max_concurrent)
        .await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in &results {
        serde_json::to_writer(&mut out, result)?;
        writeln!(out)?;
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        tracing::warn!("{} of {} URLs could not be fetched", failed, results.len());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout stays machine-readable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cert_sieve=info,warn"),
            1 => EnvFilter::new("cert_sieve=debug,info"),
            2 => EnvFilter::new("cert_sieve=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
