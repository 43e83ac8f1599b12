use std::time::Duration;

/// Portal endpoints the scraper drives
pub const LOGIN_URL: &str = "https://login.propstream.com/";
pub const APP_DOMAIN: &str = "app.propstream.com";

/// Waits, budgets and pauses used while driving the portal.
///
/// `*_probe` values are per-candidate budgets handed to the locator,
/// `*_settle` values are fixed pauses after an action, and `*_timeout`
/// values bound a whole polling loop.
#[derive(Debug, Clone)]
pub struct Timings {
    pub login_settle: Duration,
    pub login_form_timeout: Duration,
    pub login_outcome_timeout: Duration,
    pub outcome_poll: Duration,

    pub readiness_timeout: Duration,
    pub readiness_poll: Duration,
    pub gate_probe: Duration,
    pub gate_settle: Duration,
    /// Extra pause when the gate was dismissed while waiting for readiness
    pub gate_reload_settle: Duration,
    pub search_probe: Duration,

    pub search_input_probe: Duration,
    pub clear_settle: Duration,
    pub suggestion_settle: Duration,
    pub suggestion_probe: Duration,
    pub result_settle: Duration,
    pub details_probe: Duration,
    pub detail_settle: Duration,
    pub detail_marker_probe: Duration,
    pub mortgage_tab_probe: Duration,
    pub mortgage_tab_settle: Duration,
    pub grid_timeout: Duration,
    pub grid_settle: Duration,
    pub dismiss_settle: Duration,

    /// Delay between two addresses, whatever the outcome
    pub pacing: Duration,
    /// Probe interval inside a candidate budget
    pub element_poll: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            login_settle: Duration::from_secs(3),
            login_form_timeout: Duration::from_secs(10),
            login_outcome_timeout: Duration::from_secs(15),
            outcome_poll: Duration::from_millis(250),

            readiness_timeout: Duration::from_secs(60),
            readiness_poll: Duration::from_secs(2),
            gate_probe: Duration::from_millis(500),
            gate_settle: Duration::from_secs(2),
            gate_reload_settle: Duration::from_secs(3),
            search_probe: Duration::from_secs(1),

            search_input_probe: Duration::from_secs(5),
            clear_settle: Duration::from_secs(1),
            suggestion_settle: Duration::from_secs(3),
            suggestion_probe: Duration::from_secs(3),
            result_settle: Duration::from_secs(5),
            details_probe: Duration::from_secs(3),
            detail_settle: Duration::from_secs(8),
            detail_marker_probe: Duration::from_millis(2500),
            mortgage_tab_probe: Duration::from_secs(3),
            mortgage_tab_settle: Duration::from_secs(3),
            grid_timeout: Duration::from_secs(10),
            grid_settle: Duration::from_secs(2),
            dismiss_settle: Duration::from_secs(1),

            pacing: Duration::from_secs(2),
            element_poll: Duration::from_millis(250),
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub headless: bool,
    /// Forward browser console messages and responses to debug logs
    pub diagnostics: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            headless: true,
            diagnostics: false,
            window_width: 1440,
            window_height: 900,
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            )
            .to_string(),
        }
    }
}
