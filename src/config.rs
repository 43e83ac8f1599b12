use clap::Parser;
use std::env::VarError;
use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const USERNAME_VAR: &str = "PROPSTREAM_USERNAME";
pub const PASSWORD_VAR: &str = "PROPSTREAM_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "propstream-scout")]
#[command(about = "Look up PropStream valuation and mortgage data for a CSV of addresses")]
pub struct Cli {
    /// CSV file with a header row and at least one address column
    #[arg(short, long)]
    pub input: PathBuf,

    /// Address column to search with (defaults to the first column containing "address")
    #[arg(short, long)]
    pub address_column: Option<String>,

    /// Maximum properties to process, 0 for all
    #[arg(short, long, default_value_t = 5)]
    pub max_properties: usize,

    /// Verbose logs and page dumps for failed addresses
    #[arg(long)]
    pub debug: bool,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Directory the results file is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// Options for one batch run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 0 means no limit
    pub max_properties: usize,
    pub debug: bool,
    pub headless: bool,
    pub output_dir: PathBuf,
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            max_properties: cli.max_properties,
            debug: cli.debug,
            headless: !cli.headed,
            output_dir: cli.output_dir.clone(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_properties: 0,
            debug: false,
            headless: true,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Portal login
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Load credentials from the environment, after reading any `.env` file.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] if either variable is unset or blank.
pub fn load_credentials() -> Result<Credentials, ConfigError> {
    dotenvy::dotenv().ok();
    credentials_from(|key| std::env::var(key))
}

fn credentials_from<F>(lookup: F) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    Ok(Credentials {
        username: require(USERNAME_VAR)?,
        password: require(PASSWORD_VAR)?,
    })
}
