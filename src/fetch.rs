//! Page fetching with a fixed retry budget. The fetcher never surfaces an
//! error: every fault class gets its own pause and another attempt, and an
//! exhausted budget comes back as `None`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Desktop-browser identity. Some storefronts serve reduced markup or a
/// blocking page to unknown agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Retry schedule for one page.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts before giving up, counting the first.
    pub attempts: u32,
    /// Per-request time budget enforced by the HTTP client.
    pub request_timeout: Duration,
    /// Rate-limit pause grows linearly: `rate_limit_base * attempt`. A larger
    /// Retry-After header wins over the computed pause.
    pub rate_limit_base: Duration,
    /// Pause after any other non-success status.
    pub status_pause: Duration,
    /// Pause after a request timeout.
    pub timeout_pause: Duration,
    /// Pause after a transport-level error.
    pub transport_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            request_timeout: Duration::from_secs(15),
            rate_limit_base: Duration::from_secs(3),
            status_pause: Duration::from_secs(1),
            timeout_pause: Duration::from_secs(2),
            transport_pause: Duration::from_secs(1),
        }
    }
}

/// Source of page bodies. Production uses [`HttpFetcher`]; tests substitute
/// canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Best-effort GET returning the body text, or `None` once the retry
    /// budget is spent.
    async fn fetch_page(&self, url: &str) -> Option<String>;
}

/// reqwest-backed fetcher carrying the browser headers and retry schedule.
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(policy.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, policy }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Option<String> {
        for attempt in 1..=self.policy.attempts {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::OK {
                        match resp.text().await {
                            Ok(body) => return Some(body),
                            Err(err) => {
                                debug!(%url, %err, attempt, "body read failed");
                                tokio::time::sleep(self.policy.transport_pause).await;
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        let mut pause = self.policy.rate_limit_base * attempt;
                        let retry_after = resp
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.trim().parse::<u64>().ok())
                            .map(Duration::from_secs);
                        if let Some(server_pause) = retry_after {
                            pause = pause.max(server_pause);
                        }
                        debug!(%url, attempt, pause_ms = pause.as_millis() as u64, "rate limited");
                        tokio::time::sleep(pause).await;
                    } else {
                        debug!(%url, %status, attempt, "non-success status");
                        tokio::time::sleep(self.policy.status_pause).await;
                    }
                }
                Err(err) if err.is_timeout() => {
                    debug!(%url, attempt, "request timed out");
                    tokio::time::sleep(self.policy.timeout_pause).await;
                }
                Err(err) => {
                    debug!(%url, %err, attempt, "transport error");
                    tokio::time::sleep(self.policy.transport_pause).await;
                }
            }
        }
        warn!(%url, attempts = self.policy.attempts, "giving up on url");
        None
    }
}
