use async_trait::async_trait;
use headless_chrome::browser::tab::ResponseHandler;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;
use headless_chrome::protocol::cdp::Network::GetResponseBodyReturnObject;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::block_in_place;
use tracing::{debug, info, warn};

use crate::error::DriverError;
use crate::scrapers::locator::Candidate;
use crate::scrapers::traits::PageDriver;
use crate::scrapers::types::LaunchSettings;

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Finds the first visible, enabled element matching a css selector and,
/// optionally, containing some text. Evaluates to its index or -1.
const PROBE_SCRIPT: &str = r#"
(() => {
  const nodes = document.querySelectorAll(__CSS__);
  const text = __TEXT__;
  for (let i = 0; i < nodes.length; i++) {
    const el = nodes[i];
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    if (style.display === 'none' || style.visibility === 'hidden') continue;
    if (rect.width === 0 || rect.height === 0) continue;
    if (el.disabled) continue;
    const content = (el.innerText || el.textContent || '').toLowerCase();
    if (text !== null && !content.includes(text)) continue;
    return i;
  }
  return -1;
})()
"#;

const CLEAR_FN: &str = r#"
function() {
  this.focus();
  if ('value' in this) {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
  }
}
"#;

/// Headless Chrome behind the `PageDriver` seam
pub struct ChromeDriver {
    // Keeps the browser process alive for as long as the tab is used
    _browser: Browser,
    tab: Arc<Tab>,
}

fn command_error(e: impl std::fmt::Display) -> DriverError {
    DriverError::Command(e.to_string())
}

/// One console call's arguments as a single line: strings unquoted, other
/// values as JSON, falling back to the object description
fn console_text<'a, I>(args: I) -> String
where
    I: IntoIterator<Item = (Option<&'a Value>, Option<&'a str>)>,
{
    args.into_iter()
        .filter_map(|(value, description)| match value {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => description.map(str::to_string),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Forward console output and response statuses to debug logs
fn attach_diagnostics(tab: &Tab) -> Result<(), DriverError> {
    tab.enable_runtime().map_err(command_error)?;
    tab.add_event_listener(Arc::new(|event: &Event| {
        if let Event::RuntimeConsoleAPICalled(call) = event {
            let line = console_text(
                call.params
                    .args
                    .iter()
                    .map(|arg| (arg.value.as_ref(), arg.description.as_deref())),
            );
            debug!("Browser console: {}", line);
        }
    }))
    .map_err(command_error)?;

    let on_response: ResponseHandler = Box::new(
        |params: ResponseReceivedEventParams,
         _body: &dyn Fn() -> anyhow::Result<GetResponseBodyReturnObject>| {
            debug!("Response: {} {}", params.response.status, params.response.url);
        },
    );
    tab.register_response_handling("debug-responses", on_response)
        .map_err(command_error)?;
    Ok(())
}

impl ChromeDriver {
    /// Launch Chrome and open the tab every command goes through
    pub fn launch(settings: &LaunchSettings) -> Result<Self, DriverError> {
        info!(
            "🌐 Launching Chrome ({})...",
            if settings.headless { "headless" } else { "visible" }
        );

        let mut args: Vec<&OsStr> =
            vec![OsStr::new("--disable-blink-features=AutomationControlled")];
        if settings.headless {
            args.push(OsStr::new("--no-sandbox"));
            args.push(OsStr::new("--disable-dev-shm-usage"));
        }

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some((settings.window_width, settings.window_height)))
            .idle_browser_timeout(Duration::from_secs(60 * 60))
            .args(args)
            .build()
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| DriverError::LaunchFailed(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| DriverError::LaunchFailed(format!("failed to open tab: {e}")))?;
        tab.set_user_agent(&settings.user_agent, Some(ACCEPT_LANGUAGE), None)
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        if settings.diagnostics {
            match attach_diagnostics(&tab) {
                Ok(()) => debug!("Browser console and response logging enabled"),
                Err(e) => warn!("Could not enable browser diagnostics: {}", e),
            }
        }

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn probe_script(candidate: &Candidate) -> String {
        let css = serde_json::Value::from(candidate.css).to_string();
        let text = match candidate.text {
            Some(text) => serde_json::Value::from(text.to_lowercase()).to_string(),
            None => "null".to_string(),
        };
        PROBE_SCRIPT.replace("__CSS__", &css).replace("__TEXT__", &text)
    }

    fn matching_index(&self, candidate: &Candidate) -> Result<Option<usize>, DriverError> {
        let result = self
            .tab
            .evaluate(&Self::probe_script(candidate), false)
            .map_err(command_error)?;
        let index = result.value.and_then(|v| v.as_i64()).unwrap_or(-1);
        Ok(usize::try_from(index).ok())
    }

    fn element(&self, candidate: &Candidate) -> Result<Element<'_>, DriverError> {
        let index = self
            .matching_index(candidate)?
            .ok_or_else(|| DriverError::NoMatch(candidate.to_string()))?;
        self.tab
            .find_elements(candidate.css)
            .map_err(command_error)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| DriverError::NoMatch(candidate.to_string()))
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to {}", url);
        block_in_place(|| {
            self.tab
                .navigate_to(url)
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
                .map_err(|e| DriverError::NavigationFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
        })
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.tab.get_url())
    }

    async fn probe(&self, candidate: &Candidate) -> Result<bool, DriverError> {
        block_in_place(|| Ok(self.matching_index(candidate)?.is_some()))
    }

    async fn exists(&self, css: &str) -> Result<bool, DriverError> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::Value::from(css)
        );
        block_in_place(|| {
            let result = self.tab.evaluate(&script, false).map_err(command_error)?;
            Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
        })
    }

    async fn click(&self, candidate: &Candidate) -> Result<(), DriverError> {
        block_in_place(|| {
            self.element(candidate)?.click().map_err(command_error)?;
            Ok(())
        })
    }

    async fn clear(&self, candidate: &Candidate) -> Result<(), DriverError> {
        block_in_place(|| {
            self.element(candidate)?
                .call_js_fn(CLEAR_FN, vec![], false)
                .map_err(command_error)?;
            Ok(())
        })
    }

    async fn type_text(&self, candidate: &Candidate, text: &str) -> Result<(), DriverError> {
        block_in_place(|| {
            self.element(candidate)?.type_into(text).map_err(command_error)?;
            Ok(())
        })
    }

    async fn press_key(&self, candidate: Option<&Candidate>, key: &str) -> Result<(), DriverError> {
        block_in_place(|| {
            if let Some(candidate) = candidate {
                self.element(candidate)?.focus().map_err(command_error)?;
            }
            self.tab.press_key(key).map_err(command_error)?;
            Ok(())
        })
    }

    async fn text_of(&self, candidate: &Candidate) -> Result<String, DriverError> {
        block_in_place(|| self.element(candidate)?.get_inner_text().map_err(command_error))
    }

    async fn content(&self) -> Result<String, DriverError> {
        block_in_place(|| self.tab.get_content().map_err(command_error))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        block_in_place(|| {
            self.tab
                .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(command_error)
        })
    }
}
