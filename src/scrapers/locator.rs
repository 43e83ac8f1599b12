//! Fallback-chained element lookup.
//!
//! Each logical [`Target`] carries an ordered table of [`Candidate`]s. The
//! portal's markup shifts between releases, so lookups always walk the table
//! from the most specific selector down to the generic fallbacks and are
//! never cached.

use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::LocatorError;
use crate::scrapers::traits::PageDriver;

/// One selector attempt: a CSS selector, optionally narrowed to elements
/// whose visible text contains `text` (case-insensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub css: &'static str,
    pub text: Option<&'static str>,
}

impl Candidate {
    pub const fn css(css: &'static str) -> Self {
        Self { css, text: None }
    }

    pub const fn with_text(css: &'static str, text: &'static str) -> Self {
        Self {
            css,
            text: Some(text),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text {
            Some(text) => write!(f, "{}:has-text(\"{}\")", self.css, text),
            None => f.write_str(self.css),
        }
    }
}

/// Logical UI elements of the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    SearchInput,
    ProceedButton,
    SuggestionItem,
    DetailsButton,
    MortgageTab,
    LoginError,
    DetailMarker,
}

const SEARCH_INPUT: &[Candidate] = &[
    // "Enter County, City, Zip Code(s) or APN #"
    Candidate::css(r#"input[placeholder*="County" i]"#),
    Candidate::css(r#"input[placeholder*="City" i]"#),
    Candidate::css(r#"input[placeholder*="Zip Code" i]"#),
    Candidate::css(r#"input[placeholder*="APN" i]"#),
    Candidate::css(r#"input[aria-controls*="react-autowhatever"]"#),
    Candidate::css(r#"input[type="text"][autocomplete="off"]"#),
    Candidate::css(r#"input[aria-autocomplete="list"]"#),
    Candidate::css(r#"input[id*="application_id"]"#),
    Candidate::css(r#"input[type="text"]"#),
];

const PROCEED_BUTTON: &[Candidate] = &[
    Candidate::with_text("button", "Proceed"),
    Candidate::with_text(r#"button[class*="button"]"#, "Proceed"),
    Candidate::with_text(".src-components-Button-style__cuWaY__button", "Proceed"),
    Candidate::with_text(r#"button[type="button"]"#, "Proceed"),
];

const SUGGESTION_ITEM: &[Candidate] = &[
    Candidate::css(r#"li[role="option"]:first-child"#),
    Candidate::css(".react-autosuggest__suggestion:first-child"),
    Candidate::css(r#"li[data-suggestion-index="0"]"#),
    Candidate::css(r#"[class*="suggestion"]:first-child"#),
];

// Markup of this control changes most often, so match on text alone.
const DETAILS_BUTTON: &[Candidate] = &[
    Candidate::with_text("button", "details"),
    Candidate::with_text("span", "details"),
];

const MORTGAGE_TAB: &[Candidate] = &[
    Candidate::with_text(r#"li[role="tab"]"#, "Mortgage"),
    Candidate::with_text("li.react-tabs__tab", "Mortgage"),
    Candidate::with_text(r#"[data-rttab="true"]"#, "Mortgage"),
    Candidate::with_text("li", "Mortgage & Transaction History"),
    Candidate::with_text(".src-app-Property-Detail-style__adoa___tab", "Mortgage"),
];

const LOGIN_ERROR: &[Candidate] = &[
    Candidate::css(".error-message"),
    Candidate::css(".alert-danger"),
];

const DETAIL_MARKER: &[Candidate] = &[
    Candidate::with_text(r#"[class*="name"]"#, "Estimated Value"),
    Candidate::css(r#"[class*="label"]"#),
];

impl Target {
    /// Selector candidates in priority order
    pub fn candidates(self) -> &'static [Candidate] {
        match self {
            Target::SearchInput => SEARCH_INPUT,
            Target::ProceedButton => PROCEED_BUTTON,
            Target::SuggestionItem => SUGGESTION_ITEM,
            Target::DetailsButton => DETAILS_BUTTON,
            Target::MortgageTab => MORTGAGE_TAB,
            Target::LoginError => LOGIN_ERROR,
            Target::DetailMarker => DETAIL_MARKER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Target::SearchInput => "search input",
            Target::ProceedButton => "proceed button",
            Target::SuggestionItem => "suggestion item",
            Target::DetailsButton => "details button",
            Target::MortgageTab => "mortgage tab",
            Target::LoginError => "login error",
            Target::DetailMarker => "detail content",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A target resolved to the candidate that matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub target: Target,
    /// 0-based priority position of the matching candidate
    pub index: usize,
    pub candidate: Candidate,
}

/// Walks candidate tables against a page
pub struct Locator<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    poll: Duration,
}

impl<'a, D: PageDriver + ?Sized> Locator<'a, D> {
    pub fn new(driver: &'a D, poll: Duration) -> Self {
        Self { driver, poll }
    }

    /// Resolve `target`, giving each candidate up to `budget` to become
    /// visible and enabled
    pub async fn resolve(
        &self,
        target: Target,
        budget: Duration,
    ) -> Result<Resolved, LocatorError> {
        self.resolve_from(target, target.candidates(), budget).await
    }

    pub async fn resolve_from(
        &self,
        target: Target,
        candidates: &[Candidate],
        budget: Duration,
    ) -> Result<Resolved, LocatorError> {
        for (index, candidate) in candidates.iter().enumerate() {
            debug!("Trying {} selector {}: {}", target, index + 1, candidate);

            if self.probe_within(candidate, budget).await {
                debug!("✅ Found {} with selector: {}", target, candidate);
                return Ok(Resolved {
                    target,
                    index,
                    candidate: *candidate,
                });
            }
        }

        Err(LocatorError::ElementNotFound {
            target,
            tried: candidates.len(),
        })
    }

    /// Poll one candidate until it matches or `budget` runs out.
    /// A zero budget probes exactly once.
    async fn probe_within(&self, candidate: &Candidate, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;

        loop {
            match self.driver.probe(candidate).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!("Selector {} failed: {}", candidate, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.poll.min(deadline - now)).await;
        }
    }

    /// Wait until any element matches `css`, visible or not
    pub async fn wait_for_css(&self, css: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            match self.driver.exists(css).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!("Waiting for {} failed: {}", css, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.poll.min(deadline - now)).await;
        }
    }
}
