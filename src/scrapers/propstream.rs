use async_trait::async_trait;
use std::path::PathBuf;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::{ExtractionFailure, RunError};
use crate::models::{LenderEntry, PropertyDetail};
use crate::scrapers::detail::{parse_lenders, parse_scalar_fields, GRID_CONTAINER};
use crate::scrapers::locator::{Locator, Target};
use crate::scrapers::readiness::{dismiss_proceed_gate, wait_until_ready, Readiness};
use crate::scrapers::session::Authenticator;
use crate::scrapers::traits::{PageDriver, ScraperTrait};
use crate::scrapers::types::Timings;

/// Progress of one address through the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    SuggestionPending,
    DetailOpen,
    Extracted,
    Failed,
}

fn advance(state: &mut SearchState, next: SearchState) {
    debug!("Search state {:?} -> {:?}", state, next);
    *state = next;
}

/// PropStream scraper driving a logged-in browser page
pub struct PropStreamScraper<D: PageDriver> {
    driver: D,
    credentials: Credentials,
    timings: Timings,
    debug_dir: Option<PathBuf>,
}

impl<D: PageDriver> PropStreamScraper<D> {
    pub fn new(driver: D, credentials: Credentials, timings: Timings) -> Self {
        Self {
            driver,
            credentials,
            timings,
            debug_dir: None,
        }
    }

    /// Save page HTML and a screenshot into `dir` whenever an address fails
    pub fn with_debug_artifacts(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn locator(&self) -> Locator<'_, D> {
        Locator::new(&self.driver, self.timings.element_poll)
    }

    async fn extract(
        &self,
        address: &str,
        state: &mut SearchState,
    ) -> Result<PropertyDetail, ExtractionFailure> {
        let locator = self.locator();
        let timings = &self.timings;

        advance(state, SearchState::Searching);
        dismiss_proceed_gate(&self.driver, timings).await;
        let input = locator
            .resolve(Target::SearchInput, timings.search_input_probe)
            .await?;

        debug!("Entering address: {}", address);
        self.driver.click(&input.candidate).await?;
        self.driver.clear(&input.candidate).await?;
        sleep(timings.clear_settle).await;
        self.driver.type_text(&input.candidate, address).await?;
        sleep(timings.suggestion_settle).await;

        advance(state, SearchState::SuggestionPending);
        let picked = match locator
            .resolve(Target::SuggestionItem, timings.suggestion_probe)
            .await
        {
            Ok(suggestion) => match self.driver.click(&suggestion.candidate).await {
                Ok(()) => {
                    debug!("✅ Clicked suggestion: {}", suggestion.candidate);
                    true
                }
                Err(e) => {
                    debug!("Suggestion click failed: {}", e);
                    false
                }
            },
            Err(_) => false,
        };
        if !picked {
            debug!("No suggestions found, pressing Enter...");
            self.driver
                .press_key(Some(&input.candidate), "Enter")
                .await?;
        }
        sleep(timings.result_settle).await;

        let details = locator
            .resolve(Target::DetailsButton, timings.details_probe)
            .await?;
        self.driver.click(&details.candidate).await?;
        advance(state, SearchState::DetailOpen);

        sleep(timings.detail_settle).await;
        match locator
            .resolve(Target::DetailMarker, timings.detail_marker_probe)
            .await
        {
            Ok(_) => debug!("✅ Popup content detected"),
            Err(_) => debug!("⚠️ Popup content not detected, but proceeding..."),
        }

        let html = self.driver.content().await?;
        let fields = parse_scalar_fields(&html);
        let lenders = self.extract_lenders(&locator).await;

        advance(state, SearchState::Extracted);
        Ok(PropertyDetail::from_fields(fields, lenders))
    }

    /// Lenders from the mortgage history tab. Missing tab or grid yields none.
    async fn extract_lenders(&self, locator: &Locator<'_, D>) -> Vec<LenderEntry> {
        let timings = &self.timings;

        let tab = match locator
            .resolve(Target::MortgageTab, timings.mortgage_tab_probe)
            .await
        {
            Ok(tab) => tab,
            Err(e) => {
                debug!("⚠️ Could not find Mortgage & Transaction History tab: {}", e);
                return Vec::new();
            }
        };

        debug!("🏠 Clicking Mortgage & Transaction History tab...");
        if let Err(e) = self.driver.click(&tab.candidate).await {
            debug!("Mortgage tab click failed: {}", e);
            return Vec::new();
        }
        sleep(timings.mortgage_tab_settle).await;

        if !locator.wait_for_css(GRID_CONTAINER, timings.grid_timeout).await {
            debug!("⚠️ Mortgage table not found or didn't load");
            return Vec::new();
        }
        sleep(timings.grid_settle).await;

        let html = match self.driver.content().await {
            Ok(html) => html,
            Err(e) => {
                debug!("Reading mortgage table failed: {}", e);
                return Vec::new();
            }
        };

        let lenders = parse_lenders(&html);
        for lender in &lenders {
            debug!("📊 Found Lender {}: {} at {}", lender.index, lender.name, lender.rate);
        }
        if lenders.is_empty() {
            debug!("⚠️ No mortgage data found in table");
        }
        lenders
    }

    async fn dismiss_overlay(&self) {
        if let Err(e) = self.driver.press_key(None, "Escape").await {
            debug!("Closing popup failed: {}", e);
        }
        sleep(self.timings.dismiss_settle).await;
    }

    async fn save_debug_artifacts(&self, address: &str) {
        let Some(dir) = &self.debug_dir else {
            return;
        };

        let slug: String = address
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Could not create {}: {}", dir.display(), e);
            return;
        }

        match self.driver.content().await {
            Ok(html) => {
                let path = dir.join(format!("{slug}.html"));
                match tokio::fs::write(&path, html).await {
                    Ok(()) => info!("Saved page HTML to {}", path.display()),
                    Err(e) => warn!("Could not write {}: {}", path.display(), e),
                }
            }
            Err(e) => debug!("Capturing HTML failed: {}", e),
        }

        match self.driver.screenshot().await {
            Ok(png) => {
                let path = dir.join(format!("{slug}.png"));
                match tokio::fs::write(&path, png).await {
                    Ok(()) => info!("Saved screenshot to {}", path.display()),
                    Err(e) => warn!("Could not write {}: {}", path.display(), e),
                }
            }
            Err(e) => debug!("Capturing screenshot failed: {}", e),
        }
    }
}

#[async_trait]
impl<D: PageDriver> ScraperTrait for PropStreamScraper<D> {
    async fn prepare(&self) -> Result<(), RunError> {
        Authenticator::new(&self.driver, &self.timings)
            .login(&self.credentials)
            .await?;

        info!("🔍 Waiting for PropStream app to load and search input to become available...");
        match wait_until_ready(&self.driver, &self.timings).await {
            Readiness::Ready => {
                info!("✅ PropStream app loaded and ready for searching!");
                Ok(())
            }
            Readiness::TimedOut => Err(RunError::ReadinessTimeout(
                self.timings.readiness_timeout.as_secs(),
            )),
        }
    }

    async fn scrape(&self, address: &str) -> Option<PropertyDetail> {
        debug!("Searching for: {}", address);

        let mut state = SearchState::Idle;
        let result = self.extract(address, &mut state).await;

        let detail = match result {
            Ok(detail) => {
                if let Ok(json) = serde_json::to_string(&detail) {
                    debug!("Extracted {}: {}", address, json);
                }
                Some(detail)
            }
            Err(failure) => {
                warn!("Extraction for {} stopped while {:?}: {}", address, state, failure);
                advance(&mut state, SearchState::Failed);
                // capture the page as it failed, before the overlay is closed
                self.save_debug_artifacts(address).await;
                None
            }
        };

        self.dismiss_overlay().await;
        detail
    }

    fn source_name(&self) -> &'static str {
        "PropStream"
    }
}
