//! Scripted stand-in for the browser.
//!
//! Elements are modelled as candidates that are visible from a given instant
//! (tokio time, so paused-clock tests can make things appear later). Clicks
//! and key presses can be scripted to change the page.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::DriverError;
use crate::scrapers::locator::Candidate;
use crate::scrapers::traits::PageDriver;

/// Page change triggered by a click or key press
#[derive(Debug, Clone)]
pub enum Reaction {
    Show(Candidate),
    Hide(Candidate),
    SetUrl(String),
    SetContent(String),
    AddCss(&'static str),
}

#[derive(Default)]
struct PageState {
    url: String,
    content: String,
    visible: HashMap<Candidate, Instant>,
    css: HashMap<String, Instant>,
    texts: HashMap<Candidate, String>,
    on_click: HashMap<Candidate, Vec<Reaction>>,
    on_key: HashMap<String, Vec<Reaction>>,
    probed: Vec<Candidate>,
    log: Vec<String>,
}

#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<PageState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut PageState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn show(&self, candidate: Candidate) {
        self.show_after(candidate, Duration::ZERO);
    }

    pub fn show_after(&self, candidate: Candidate, delay: Duration) {
        self.with(|s| s.visible.insert(candidate, Instant::now() + delay));
    }

    pub fn add_css(&self, css: &str) {
        self.add_css_after(css, Duration::ZERO);
    }

    pub fn add_css_after(&self, css: &str, delay: Duration) {
        self.with(|s| s.css.insert(css.to_string(), Instant::now() + delay));
    }

    pub fn set_content(&self, html: &str) {
        self.with(|s| s.content = html.to_string());
    }

    pub fn set_text(&self, candidate: Candidate, text: &str) {
        self.with(|s| s.texts.insert(candidate, text.to_string()));
    }

    pub fn on_click(&self, candidate: Candidate, reactions: Vec<Reaction>) {
        self.with(|s| s.on_click.insert(candidate, reactions));
    }

    pub fn on_key(&self, key: &str, reactions: Vec<Reaction>) {
        self.with(|s| s.on_key.insert(key.to_string(), reactions));
    }

    /// Candidates probed so far, in order
    pub fn probed(&self) -> Vec<Candidate> {
        self.with(|s| s.probed.clone())
    }

    /// Commands issued so far (clicks, typing, key presses, navigation)
    pub fn log(&self) -> Vec<String> {
        self.with(|s| s.log.clone())
    }

    fn is_visible(state: &PageState, candidate: &Candidate) -> bool {
        state
            .visible
            .get(candidate)
            .is_some_and(|since| Instant::now() >= *since)
    }

    fn apply(state: &mut PageState, reactions: Vec<Reaction>) {
        let now = Instant::now();
        for reaction in reactions {
            match reaction {
                Reaction::Show(c) => {
                    state.visible.insert(c, now);
                }
                Reaction::Hide(c) => {
                    state.visible.remove(&c);
                }
                Reaction::SetUrl(url) => state.url = url,
                Reaction::SetContent(html) => state.content = html,
                Reaction::AddCss(css) => {
                    state.css.insert(css.to_string(), now);
                }
            }
        }
    }

    fn require_visible(state: &PageState, candidate: &Candidate) -> Result<(), DriverError> {
        if Self::is_visible(state, candidate) {
            Ok(())
        } else {
            Err(DriverError::NoMatch(candidate.to_string()))
        }
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.with(|s| {
            s.log.push(format!("goto {url}"));
            s.url = url.to_string();
        });
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.with(|s| s.url.clone()))
    }

    async fn probe(&self, candidate: &Candidate) -> Result<bool, DriverError> {
        Ok(self.with(|s| {
            s.probed.push(*candidate);
            Self::is_visible(s, candidate)
        }))
    }

    async fn exists(&self, css: &str) -> Result<bool, DriverError> {
        Ok(self.with(|s| s.css.get(css).is_some_and(|since| Instant::now() >= *since)))
    }

    async fn click(&self, candidate: &Candidate) -> Result<(), DriverError> {
        self.with(|s| {
            Self::require_visible(s, candidate)?;
            s.log.push(format!("click {candidate}"));
            if let Some(reactions) = s.on_click.get(candidate).cloned() {
                Self::apply(s, reactions);
            }
            Ok(())
        })
    }

    async fn clear(&self, candidate: &Candidate) -> Result<(), DriverError> {
        self.with(|s| {
            Self::require_visible(s, candidate)?;
            s.log.push(format!("clear {candidate}"));
            Ok(())
        })
    }

    async fn type_text(&self, candidate: &Candidate, text: &str) -> Result<(), DriverError> {
        self.with(|s| {
            Self::require_visible(s, candidate)?;
            s.log.push(format!("type {candidate} {text}"));
            Ok(())
        })
    }

    async fn press_key(&self, candidate: Option<&Candidate>, key: &str) -> Result<(), DriverError> {
        self.with(|s| {
            if let Some(candidate) = candidate {
                Self::require_visible(s, candidate)?;
            }
            s.log.push(format!("press {key}"));
            if let Some(reactions) = s.on_key.get(key).cloned() {
                Self::apply(s, reactions);
            }
            Ok(())
        })
    }

    async fn text_of(&self, candidate: &Candidate) -> Result<String, DriverError> {
        self.with(|s| {
            Self::require_visible(s, candidate)?;
            Ok(s.texts.get(candidate).cloned().unwrap_or_default())
        })
    }

    async fn content(&self) -> Result<String, DriverError> {
        Ok(self.with(|s| s.content.clone()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        Ok(Vec::new())
    }
}

/// HTML the scripted portal serves
pub mod fixtures {
    pub const DETAIL_HTML: &str = r#"
    <div class="modal">
      <div class="stat"><div class="name">Estimated Value</div><div class="label">$425,300</div></div>
      <div class="stat"><div class="name">Last Sale (Public Record)</div><div class="label">$310,000 05/14/2019</div></div>
      <div class="facts"><div><span>Beds</span><span>3</span></div><div><span>Baths</span><span>2</span></div></div>
      <div class="fin"><div class="name">Open Mortgages</div><div class="value-label">2</div></div>
      <div class="fin"><div class="name">Estimated Balance</div><div class="value-label">$198,750</div></div>
    </div>"#;

    pub const GRID_HTML: &str = r#"
    <div class="ag-center-cols-container">
      <div class="ag-row"><div col-id="lenderName">Bank A</div><div col-id="loanInterestRate">4.5%</div></div>
      <div class="ag-row"><div col-id="lenderName"></div><div col-id="loanInterestRate"></div></div>
      <div class="ag-row"><div col-id="lenderName">Bank B</div><div col-id="loanInterestRate">3.9%</div></div>
    </div>"#;
}

impl FakeDriver {
    /// A portal where login succeeds, the app is ready at once and every
    /// search opens the same property with two lenders
    pub fn portal() -> Self {
        use crate::scrapers::detail::GRID_CONTAINER;
        use crate::scrapers::locator::Target;
        use crate::scrapers::session::{PASSWORD_FIELD, USERNAME_FIELD};

        let driver = Self::new();
        driver.add_css(USERNAME_FIELD.css);
        driver.show(USERNAME_FIELD);
        driver.show(PASSWORD_FIELD);
        driver.on_key(
            "Enter",
            vec![Reaction::SetUrl("https://app.propstream.com/search".to_string())],
        );

        let mortgage_tab = Target::MortgageTab.candidates()[0];
        let details = Target::DetailsButton.candidates()[0];
        driver.show(Target::SearchInput.candidates()[0]);
        driver.show(Target::SuggestionItem.candidates()[0]);
        driver.show(details);
        driver.on_click(
            details,
            vec![
                Reaction::SetContent(fixtures::DETAIL_HTML.to_string()),
                Reaction::Show(Target::DetailMarker.candidates()[0]),
                Reaction::Show(mortgage_tab),
            ],
        );
        driver.on_click(
            mortgage_tab,
            vec![
                Reaction::SetContent(fixtures::GRID_HTML.to_string()),
                Reaction::AddCss(GRID_CONTAINER),
            ],
        );
        driver
    }
}
