use crate::error::{DriverError, RunError};
use crate::models::PropertyDetail;
use crate::scrapers::locator::Candidate;
use async_trait::async_trait;

/// Common trait for property data sources driven by the batch runner
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Bring the source into a searchable state. Called once per run.
    async fn prepare(&self) -> Result<(), RunError>;

    /// Look up one address. `None` means nothing could be extracted.
    async fn scrape(&self, address: &str) -> Option<PropertyDetail>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}

/// Browser commands used by the scraper.
///
/// Every element-level command acts on the first element matching the
/// candidate that is visible and enabled at the time of the call.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Whether the candidate currently matches a visible, enabled element
    async fn probe(&self, candidate: &Candidate) -> Result<bool, DriverError>;

    /// Whether any element matches `css`, regardless of visibility
    async fn exists(&self, css: &str) -> Result<bool, DriverError>;

    async fn click(&self, candidate: &Candidate) -> Result<(), DriverError>;

    async fn clear(&self, candidate: &Candidate) -> Result<(), DriverError>;

    async fn type_text(&self, candidate: &Candidate, text: &str) -> Result<(), DriverError>;

    /// Press a key, on the candidate when given, otherwise on the page
    async fn press_key(&self, candidate: Option<&Candidate>, key: &str) -> Result<(), DriverError>;

    async fn text_of(&self, candidate: &Candidate) -> Result<String, DriverError>;

    /// Serialized HTML of the whole document
    async fn content(&self) -> Result<String, DriverError>;

    /// PNG of the current viewport
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    async fn fill(&self, candidate: &Candidate, text: &str) -> Result<(), DriverError> {
        self.clear(candidate).await?;
        self.type_text(candidate, text).await
    }
}
