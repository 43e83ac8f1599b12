//! Waiting for the app to become searchable after login.

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::scrapers::locator::{Locator, Target};
use crate::scrapers::traits::PageDriver;
use crate::scrapers::types::Timings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
}

/// Click the "Proceed" confirmation if the app is showing one.
///
/// Returns `true` when a gate was found and clicked.
pub async fn dismiss_proceed_gate<D: PageDriver + ?Sized>(driver: &D, timings: &Timings) -> bool {
    let locator = Locator::new(driver, timings.element_poll);
    let Ok(gate) = locator.resolve(Target::ProceedButton, timings.gate_probe).await else {
        return false;
    };

    info!("🔘 Found 'Proceed' button, clicking it...");
    if let Err(e) = driver.click(&gate.candidate).await {
        warn!("Clicking {} failed: {}", gate.candidate, e);
        return false;
    }
    sleep(timings.gate_settle).await;
    debug!("'Proceed' button clicked");
    true
}

/// Poll until the search input resolves or the readiness budget is spent
pub async fn wait_until_ready<D: PageDriver + ?Sized>(driver: &D, timings: &Timings) -> Readiness {
    let locator = Locator::new(driver, timings.element_poll);
    let deadline = Instant::now() + timings.readiness_timeout;
    let mut attempt = 1;

    while Instant::now() < deadline {
        debug!("🔍 Attempt {}: looking for search input field...", attempt);

        if dismiss_proceed_gate(driver, timings).await {
            sleep(timings.gate_reload_settle).await;
        }

        match locator.resolve(Target::SearchInput, timings.search_probe).await {
            Ok(found) => {
                debug!("Search input matched {}", found.candidate);
                return Readiness::Ready;
            }
            Err(e) => debug!("{}", e),
        }

        sleep(timings.readiness_poll).await;
        attempt += 1;
    }

    warn!(
        "❌ Could not find search input after {} seconds",
        timings.readiness_timeout.as_secs()
    );
    Readiness::TimedOut
}
