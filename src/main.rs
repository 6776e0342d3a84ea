//! jobtrawl CLI entry point

use clap::{ArgGroup, Parser};
use jobtrawl::{
    commands::{cmd_scrape, print_scrape_stats, ScrapeOptions},
    config::{Config, SearchTarget},
    error::Result,
    progress::LogWriterFactory,
    snapshot,
};
use std::path::Path;
use tracing::{error, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "jobtrawl")]
#[command(version, about = "Scrape job postings into a normalized SQLite database", long_about = None)]
#[command(group(ArgGroup::new("target").args(["il", "dsus", "uk", "all"])))]
struct Cli {
    /// Result pages to visit per search
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=30))]
    limit_search_pages: Option<u32>,

    /// Postings to extract, counted from the first collected link
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=1000))]
    limit_job_posts: Option<u64>,

    /// Search Israeli postings
    #[arg(long)]
    il: bool,

    /// Search data scientist postings in the US
    #[arg(long)]
    dsus: bool,

    /// Search UK postings
    #[arg(long)]
    uk: bool,

    /// Run every predefined search (default)
    #[arg(long)]
    all: bool,
}

impl Cli {
    fn target(&self) -> SearchTarget {
        if self.il {
            SearchTarget::Israel
        } else if self.dsus {
            SearchTarget::DataScientistsUs
        } else if self.uk {
            SearchTarget::Uk
        } else {
            SearchTarget::All
        }
    }

    fn options(&self) -> ScrapeOptions {
        ScrapeOptions {
            target: self.target(),
            max_pages: self.limit_search_pages,
            max_postings: self.limit_job_posts.map(|n| n as usize),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default();
    init_logging(config.as_ref().ok().map(|c| c.output.dir.as_path()));
    let config = config?;

    let stats = cmd_scrape(&config, &cli.options()).await?;
    print_scrape_stats(&stats);
    Ok(())
}

/// Console logging through the progress bars, plus a per-run log file in
/// `log_dir` when it can be created
fn init_logging(log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_error = None;
    let file_layer = log_dir.and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => {
            let name = format!("jobtrawl_{}.log", snapshot::run_stamp(chrono::Utc::now()));
            let appender = RollingFileAppender::new(Rotation::NEVER, dir, name);
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true),
            )
        }
        Err(e) => {
            file_error = Some(format!("Log directory {:?} unavailable: {}", dir, e));
            None
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(file_layer)
        .with(filter)
        .init();

    if let Some(message) = file_error {
        warn!("{}", message);
    }
}
