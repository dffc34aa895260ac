use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use doopla::config::Settings;
use doopla::{build_scraper, FetchResult, ScrapeError};

#[derive(Parser, Debug)]
#[command(name = "doopla")]
#[command(about = "Show stdout and stderr of the latest failed Hadoop job")]
#[command(version)]
struct Cli {
    /// Job to inspect; defaults to the most recent failed job of the configured user
    jobid: Option<String>,

    /// Settings file (defaults to $DOOPLA_CONFIG or ~/.doopla)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Accept self-signed or otherwise invalid TLS certificates
    #[arg(long)]
    insecure: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load(&path)?;
    if cli.insecure {
        settings.main.accept_invalid_certs = true;
    }
    debug!("Loaded settings from {}: {:?}", path.display(), settings.main);

    let mut scraper = build_scraper(&settings)?;

    match scraper.fetch_output(cli.jobid.as_deref()) {
        Ok(result) => {
            print_result(&result);
            Ok(())
        }
        Err(ScrapeError::NoJobsForUser { user }) => {
            println!("No failed jobs for user {}", user);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_result(result: &FetchResult) {
    println!("\nStdout for Jobid: {}\n", result.job_id.blue());

    let sections = [
        ("Mapper::Stdout", &result.mapper.stdout),
        ("Mapper::Stderr", &result.mapper.stderr),
        ("Reducer::Stdout", &result.reducer.stdout),
        ("Reducer::Stderr", &result.reducer.stderr),
    ];

    for (title, text) in sections {
        println!("{}\n", title.bold());
        if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
            println!("{}\n", text);
        }
    }
}
