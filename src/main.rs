mod batch;
mod config;
mod error;
mod models;
mod scrapers;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use batch::{AddressBook, BatchOutcome, LogReporter};
use config::{Cli, Credentials, RunConfig};
use error::RunError;
use scrapers::{ChromeDriver, LaunchSettings, PropStreamScraper, Timings};

/// Where page dumps for failed addresses go in debug mode
const DEBUG_DIR: &str = "debug";

fn init_tracing(debug: bool) {
    let fallback = if debug {
        "propstream_scout=debug"
    } else {
        "propstream_scout=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn scout(cli: &Cli, credentials: Credentials) -> Result<(), RunError> {
    let config = RunConfig::from(cli);

    let book = AddressBook::from_path(&cli.input, cli.address_column.as_deref())?;
    info!(
        "📄 Loaded {} rows from {} (address column: {})",
        book.len(),
        cli.input.display(),
        book.address_header()
    );

    let driver = ChromeDriver::launch(&LaunchSettings {
        headless: config.headless,
        diagnostics: config.debug,
        ..LaunchSettings::default()
    })?;

    let timings = Timings::default();
    let pacing = timings.pacing;
    let mut scraper = PropStreamScraper::new(driver, credentials, timings);
    if config.debug {
        scraper = scraper.with_debug_artifacts(DEBUG_DIR);
    }

    match batch::run(&scraper, &book, &config, pacing, &LogReporter).await? {
        BatchOutcome::Completed(table) => {
            let path = table.save(&config.output_dir)?;
            info!("💾 Saved {} rows to {}", table.len(), path.display());
        }
        BatchOutcome::Empty => {
            warn!("No data was successfully extracted. Please check your CSV file and try again.");
            if config.debug {
                info!("Page dumps for failed addresses are in {}/", DEBUG_DIR);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    info!("🏠 PropStream Scout");
    info!("===================");

    let credentials =
        config::load_credentials().context("PropStream credentials are not configured")?;

    if let Err(e) = scout(&cli, credentials).await {
        error!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}
