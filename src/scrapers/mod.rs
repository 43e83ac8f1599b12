pub mod browser;
pub mod detail;
#[cfg(test)]
pub(crate) mod fake;
pub mod locator;
pub mod normalize;
pub mod propstream;
pub mod readiness;
pub mod session;
pub mod traits;
pub mod types;

pub use browser::ChromeDriver;
pub use propstream::PropStreamScraper;
pub use traits::ScraperTrait;
pub use types::{LaunchSettings, Timings};
