//! Portal login.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::AuthError;
use crate::scrapers::locator::{Candidate, Locator, Target};
use crate::scrapers::traits::PageDriver;
use crate::scrapers::types::{Timings, APP_DOMAIN, LOGIN_URL};

pub(crate) const USERNAME_FIELD: Candidate = Candidate::css(r#"input[name="username"]"#);
pub(crate) const PASSWORD_FIELD: Candidate = Candidate::css(r#"input[name="password"]"#);

/// Where the rejection message is read from, broadest last
const ERROR_TEXT: &[Candidate] = &[
    Candidate::css(".error-message"),
    Candidate::css(".alert-danger"),
    Candidate::css(".error"),
    Candidate::css(r#"[class*="error"]"#),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    FormSubmitted,
    Authenticated,
    Rejected(Option<String>),
}

enum Outcome {
    Authenticated,
    Rejected(Option<String>),
}

/// Drives the login form once per run
pub struct Authenticator<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    timings: &'a Timings,
    state: AuthState,
}

impl<'a, D: PageDriver + ?Sized> Authenticator<'a, D> {
    pub fn new(driver: &'a D, timings: &'a Timings) -> Self {
        Self {
            driver,
            timings,
            state: AuthState::Unauthenticated,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    fn transition(&mut self, next: AuthState) {
        debug!("Login state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Log in with `credentials`. Succeeds only once the browser has landed
    /// on the application domain.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), AuthError> {
        info!("🔐 Navigating to PropStream login page...");
        self.driver.goto(LOGIN_URL).await?;
        sleep(self.timings.login_settle).await;

        let locator = Locator::new(self.driver, self.timings.element_poll);
        if !locator
            .wait_for_css(USERNAME_FIELD.css, self.timings.login_form_timeout)
            .await
        {
            return Err(AuthError::FormMissing);
        }

        self.driver.fill(&USERNAME_FIELD, &credentials.username).await?;
        self.driver.fill(&PASSWORD_FIELD, &credentials.password).await?;

        info!("📝 Credentials entered, submitting login form...");
        self.driver.press_key(Some(&PASSWORD_FIELD), "Enter").await?;
        self.transition(AuthState::FormSubmitted);

        match self.await_outcome().await? {
            Outcome::Authenticated => {
                self.transition(AuthState::Authenticated);
                info!("✅ Successfully logged into PropStream!");
                Ok(())
            }
            Outcome::Rejected(message) => {
                self.transition(AuthState::Rejected(message.clone()));
                Err(AuthError::LoginRejected(message))
            }
        }
    }

    /// Race the redirect to the app against a visible error indicator
    async fn await_outcome(&self) -> Result<Outcome, AuthError> {
        let locator = Locator::new(self.driver, self.timings.element_poll);
        let deadline = Instant::now() + self.timings.login_outcome_timeout;

        loop {
            match self.driver.current_url().await {
                Ok(url) if url.contains(APP_DOMAIN) => return Ok(Outcome::Authenticated),
                Ok(_) => {}
                Err(e) => debug!("Reading location failed: {}", e),
            }

            if locator
                .resolve(Target::LoginError, Duration::ZERO)
                .await
                .is_ok()
            {
                let message = self.error_text().await;
                warn!(
                    "Login failed: {}",
                    message.as_deref().unwrap_or("unknown error")
                );
                return Ok(Outcome::Rejected(message));
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AuthError::LoginTimeout);
            }
            sleep(self.timings.outcome_poll.min(deadline - now)).await;
        }
    }

    async fn error_text(&self) -> Option<String> {
        for candidate in ERROR_TEXT {
            if !matches!(self.driver.probe(candidate).await, Ok(true)) {
                continue;
            }
            match self.driver.text_of(candidate).await {
                Ok(text) if !text.trim().is_empty() => return Some(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => debug!("Reading {} failed: {}", candidate, e),
            }
        }
        None
    }
}
