//! Page sessions used to load hotel listings.
//!
//! A session is opened by a [`BrowserLauncher`], driven through
//! navigate / wait / read-source, and must be closed by its owner. The
//! WebDriver session also tears itself down from `Drop` if the owner never
//! got to `close` (panic or cancelled future).

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::providers::http_errors::{HOTEL_SITE, request_error};
use crate::retry::send_with_retry;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const CHROME_ARGS: [&str; 3] = ["--headless=new", "--disable-gpu", "--no-sandbox"];

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("could not start browser session: {0}")]
    Start(String),

    #[error("navigation to '{url}' failed: {message}")]
    Navigation { url: String, message: String },

    #[error("results did not appear within {waited_secs}s (waited for '{selector}')")]
    MarkerTimeout { selector: String, waited_secs: u64 },

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("no page has been loaded in this session")]
    NoPage,
}

pub type BrowserFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BrowserError>> + 'a>>;

pub trait PageSession {
    fn goto<'a>(&'a mut self, url: &'a str) -> BrowserFuture<'a, ()>;

    /// Resolves once an element matching `css` is present, or fails with
    /// [`BrowserError::MarkerTimeout`].
    fn wait_for<'a>(&'a mut self, css: &'a str, timeout: Duration) -> BrowserFuture<'a, ()>;

    fn page_source<'a>(&'a mut self) -> BrowserFuture<'a, String>;

    /// Releases the session. Calling it twice is a no-op.
    fn close<'a>(&'a mut self) -> BrowserFuture<'a, ()>;
}

pub trait BrowserLauncher {
    fn open<'a>(&'a self) -> BrowserFuture<'a, Box<dyn PageSession + 'a>>;
}

/// Loads pages with a plain GET. No JavaScript runs, so this only works for
/// server-rendered result pages.
pub struct HttpPageLauncher {
    client: Client,
    retry: RetryPolicy,
    timeout: Duration,
}

impl HttpPageLauncher {
    pub fn new(client: Client, retry: RetryPolicy, timeout_secs: u64) -> Self {
        Self {
            client,
            retry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl BrowserLauncher for HttpPageLauncher {
    fn open<'a>(&'a self) -> BrowserFuture<'a, Box<dyn PageSession + 'a>> {
        Box::pin(async move {
            debug!("opening http page session");
            Ok(Box::new(HttpPageSession {
                launcher: self,
                document: None,
            }) as Box<dyn PageSession + 'a>)
        })
    }
}

struct HttpPageSession<'a> {
    launcher: &'a HttpPageLauncher,
    document: Option<String>,
}

impl PageSession for HttpPageSession<'_> {
    fn goto<'a>(&'a mut self, url: &'a str) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            let launcher = self.launcher;
            let response = send_with_retry(&launcher.retry, url, || {
                launcher.client.get(url).timeout(launcher.timeout)
            })
            .await
            .map_err(|err| BrowserError::Navigation {
                url: url.to_string(),
                message: format!(
                    "{:#}",
                    request_error(HOTEL_SITE, err, url, launcher.timeout.as_secs())
                ),
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    message: format!("status {status}"),
                });
            }
            let body = response.text().await.map_err(|err| BrowserError::Navigation {
                url: url.to_string(),
                message: format!("failed to read page body: {err}"),
            })?;
            debug!(url, html_length = body.len(), "fetched page");
            self.document = Some(body);
            Ok(())
        })
    }

    /// A fetched page is already complete; there is nothing to wait for.
    fn wait_for<'a>(&'a mut self, css: &'a str, _timeout: Duration) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            if self.document.is_none() {
                return Err(BrowserError::NoPage);
            }
            debug!(selector = css, "fetched page is ready");
            Ok(())
        })
    }

    fn page_source<'a>(&'a mut self) -> BrowserFuture<'a, String> {
        Box::pin(async move { self.document.clone().ok_or(BrowserError::NoPage) })
    }

    fn close<'a>(&'a mut self) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            self.document = None;
            Ok(())
        })
    }
}

/// Drives Chrome through a WebDriver endpoint such as chromedriver.
pub struct WebDriverLauncher {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl WebDriverLauncher {
    /// `timeout_secs` bounds every single WebDriver command.
    pub fn new(client: Client, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

fn wire_error(value: &Value) -> Option<String> {
    let error = value.get("error")?.as_str()?;
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(format!("{error}: {message}"))
}

async fn command(
    client: &Client,
    timeout: Duration,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, String> {
    let mut request = client.request(method, url).timeout(timeout);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await.map_err(|err| err.to_string())?;
    let status = response.status();
    let reply: WireReply = response
        .json()
        .await
        .map_err(|err| format!("unreadable reply (status {status}): {err}"))?;

    if let Some(message) = wire_error(&reply.value) {
        return Err(message);
    }
    if !status.is_success() {
        return Err(format!("status {status}"));
    }
    Ok(reply.value)
}

fn new_session_body() -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": CHROME_ARGS }
            }
        }
    })
}

impl BrowserLauncher for WebDriverLauncher {
    fn open<'a>(&'a self) -> BrowserFuture<'a, Box<dyn PageSession + 'a>> {
        Box::pin(async move {
            let url = format!("{}/session", self.endpoint);
            let value = command(
                &self.client,
                self.timeout,
                Method::POST,
                &url,
                Some(new_session_body()),
            )
            .await
                .map_err(|message| {
                    BrowserError::Start(format!(
                        "{message} (is a WebDriver listening at '{}'? set WEBDRIVER_URL)",
                        self.endpoint
                    ))
                })?;
            let session: NewSession = serde_json::from_value(value)
                .map_err(|err| BrowserError::Start(format!("malformed new-session reply: {err}")))?;

            info!(session_id = %session.session_id, endpoint = %self.endpoint, "webdriver session started");
            Ok(Box::new(WebDriverSession {
                client: self.client.clone(),
                base: format!("{}/session/{}", self.endpoint, session.session_id),
                timeout: self.timeout,
                closed: false,
            }) as Box<dyn PageSession + 'a>)
        })
    }
}

struct WebDriverSession {
    client: Client,
    base: String,
    timeout: Duration,
    closed: bool,
}

impl WebDriverSession {
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, String> {
        let url = format!("{}{}", self.base, path);
        command(&self.client, self.timeout, method, &url, body).await
    }

    async fn count_matches(&self, css: &str) -> Result<usize, BrowserError> {
        let value = self
            .call(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await
            .map_err(BrowserError::Protocol)?;
        Ok(value.as_array().map(Vec::len).unwrap_or(0))
    }
}

impl PageSession for WebDriverSession {
    fn goto<'a>(&'a mut self, url: &'a str) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            debug!(url, "webdriver navigating");
            self.call(Method::POST, "/url", Some(json!({ "url": url })))
                .await
                .map(|_| ())
                .map_err(|message| BrowserError::Navigation {
                    url: url.to_string(),
                    message,
                })
        })
    }

    fn wait_for<'a>(&'a mut self, css: &'a str, timeout: Duration) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            let deadline = Instant::now() + timeout;
            loop {
                let found = self.count_matches(css).await?;
                if found > 0 {
                    debug!(selector = css, found, "page marker present");
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    return Err(BrowserError::MarkerTimeout {
                        selector: css.to_string(),
                        waited_secs: timeout.as_secs(),
                    });
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        })
    }

    fn page_source<'a>(&'a mut self) -> BrowserFuture<'a, String> {
        Box::pin(async move {
            let value = self
                .call(Method::GET, "/source", None)
                .await
                .map_err(BrowserError::Protocol)?;
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| BrowserError::Protocol("page source was not a string".to_string()))
        })
    }

    fn close<'a>(&'a mut self) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            self.call(Method::DELETE, "", None)
                .await
                .map(|_| debug!(session = %self.base, "webdriver session closed"))
                .map_err(BrowserError::Protocol)
        })
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!(session = %self.base, "webdriver session dropped without close; deleting in background");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let client = self.client.clone();
            let url = self.base.clone();
            let timeout = self.timeout;
            handle.spawn(async move {
                match command(&client, timeout, Method::DELETE, &url, None).await {
                    Ok(_) => debug!(session = %url, "dropped webdriver session deleted"),
                    Err(message) => {
                        warn!(
                            session = %url,
                            error = %message,
                            "failed to delete dropped webdriver session"
                        )
                    }
                }
            });
        } else {
            warn!(session = %self.base, "no async runtime to delete webdriver session; it stays open");
        }
    }
}
