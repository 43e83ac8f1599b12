use thiserror::Error;

use crate::scrapers::locator::Target;

/// A browser command failed
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("no element matches {0}")]
    NoMatch(String),

    #[error("browser command failed: {0}")]
    Command(String),
}

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("no candidate matched {target} (tried {tried})")]
    ElementNotFound { target: Target, tried: usize },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login form did not appear")]
    FormMissing,

    #[error("timed out waiting for the login outcome")]
    LoginTimeout,

    #[error("login rejected: {}", .0.as_deref().unwrap_or("unknown error, check credentials"))]
    LoginRejected(Option<String>),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Why one field, or one address, could not be extracted
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("no element labelled \"{label}\"")]
    AnchorMissing { label: &'static str },

    #[error("\"{label}\" has no readable value")]
    ValueMissing { label: &'static str },

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// The input table cannot be used
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no column containing \"address\" found in the input")]
    NoAddressColumn,

    #[error("column \"{name}\" is not an address column (available: {available})")]
    UnknownColumn { name: String, available: String },

    #[error("failed to read input: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Failures that stop the whole run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("search input never became available after {0}s")]
    ReadinessTimeout(u64),

    #[error(transparent)]
    Browser(#[from] DriverError),

    #[error("failed to write results: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to write results: {0}")]
    OutputCsv(#[from] csv::Error),
}
