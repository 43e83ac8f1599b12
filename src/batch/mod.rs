pub mod input;
pub mod output;

pub use input::AddressBook;
pub use output::ResultTable;

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::RunError;
use crate::models::{AddressRecord, PropertyDetail};
use crate::scrapers::ScraperTrait;

/// What happened to one address
#[derive(Debug, Clone, Copy)]
pub enum AddressOutcome<'a> {
    Extracted(&'a PropertyDetail),
    Failed,
}

/// Receives progress as the batch runs
pub trait ProgressReporter: Send + Sync {
    fn started(&self, total: usize);
    fn address_done(&self, done: usize, total: usize, address: &str, outcome: AddressOutcome<'_>);
    fn finished(&self, rows: usize);
}

/// Reports progress through `tracing`
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn started(&self, total: usize) {
        info!("🚀 Processing {} properties", total);
    }

    fn address_done(&self, done: usize, total: usize, address: &str, outcome: AddressOutcome<'_>) {
        match outcome {
            AddressOutcome::Extracted(detail) => {
                info!("✅ {} - {}", address, detail.summary());
            }
            AddressOutcome::Failed => warn!("❌ Failed to extract data for: {}", address),
        }
        info!("Progress: {}/{}", done, total);
    }

    fn finished(&self, rows: usize) {
        info!("🏁 Scraping completed! Total entries processed: {}", rows);
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    Completed(ResultTable),
    /// Nothing was processed, so there is nothing to write
    Empty,
}

/// Addresses that will be searched: non-blank ones, capped at `max` (0 = all)
pub fn select_addresses(book: &AddressBook, max: usize) -> Vec<&AddressRecord> {
    let limit = if max == 0 { usize::MAX } else { max };
    book.records
        .iter()
        .filter(|r| !r.is_blank())
        .take(limit)
        .collect()
}

/// Log in, then search every selected address in order.
///
/// Every searched address yields exactly one row; a failed search gets a row
/// with every scraped column marked unavailable. Only pre-flight failures
/// (login, readiness) abort the run.
pub async fn run<S, R>(
    scraper: &S,
    book: &AddressBook,
    config: &RunConfig,
    pacing: Duration,
    reporter: &R,
) -> Result<BatchOutcome, RunError>
where
    S: ScraperTrait + ?Sized,
    R: ProgressReporter + ?Sized,
{
    let selected = select_addresses(book, config.max_properties);
    if selected.is_empty() {
        info!("No non-blank addresses to process");
        return Ok(BatchOutcome::Empty);
    }

    info!("🔐 Connecting to {}...", scraper.source_name());
    scraper.prepare().await?;

    let total = selected.len();
    reporter.started(total);

    let mut table = ResultTable::new(book.headers.clone());
    for (i, record) in selected.iter().enumerate() {
        if i > 0 {
            sleep(pacing).await;
        }

        info!("Processing property {}/{}: {}", i + 1, total, record.address);
        match scraper.scrape(&record.address).await {
            Some(detail) => {
                let outcome = AddressOutcome::Extracted(&detail);
                reporter.address_done(i + 1, total, &record.address, outcome);
                table.push(record.values.clone(), detail);
            }
            None => {
                reporter.address_done(i + 1, total, &record.address, AddressOutcome::Failed);
                table.push(record.values.clone(), PropertyDetail::unavailable());
            }
        }
    }

    reporter.finished(table.len());
    if table.is_empty() {
        Ok(BatchOutcome::Empty)
    } else {
        Ok(BatchOutcome::Completed(table))
    }
}
