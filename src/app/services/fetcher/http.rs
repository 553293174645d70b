//! HTTP page source with randomized headers and retry-with-backoff

use super::PageSource;
use super::retry::{Backoff, is_retryable_status, jitter, pick_user_agent};
use crate::config::FetchConfig;
use crate::{Error, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, info, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// Fetches the live ranking page over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
    url: String,
    config: FetchConfig,
}

impl HttpPageSource {
    /// Create a source for `url` using the request settings in `config`
    pub fn new(url: impl Into<String>, config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            config,
        })
    }

    /// Page URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// One request; `Ok(Err(msg))` marks a retryable failure
    async fn attempt(&self, user_agent: &str) -> Result<std::result::Result<String, String>> {
        let response = match self
            .client
            .get(&self.url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_EN)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(Err(format!("request failed: {}", e))),
        };

        let status = response.status();
        if !status.is_success() {
            if is_retryable_status(status.as_u16()) {
                return Ok(Err(format!("HTTP {}", status)));
            }
            return Err(Error::http_status(self.url.clone(), status.as_u16()));
        }

        match response.text().await {
            Ok(body) => Ok(Ok(body)),
            Err(e) => Ok(Err(format!("failed to read body: {}", e))),
        }
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self) -> Result<String> {
        let backoff = Backoff::new(
            Duration::from_millis(self.config.initial_backoff_ms),
            self.config.backoff_multiplier,
        );
        let mut last_failure = String::from("no attempt made");

        for attempt in 1..=self.config.max_attempts {
            let delay = jitter(self.config.jitter_min_ms, self.config.jitter_max_ms);
            if !delay.is_zero() {
                debug!("Waiting {:?} before request", delay);
                tokio::time::sleep(delay).await;
            }

            let user_agent = pick_user_agent(&self.config.user_agents)
                .unwrap_or_default()
                .to_string();
            debug!(
                "GET {} (attempt {}/{})",
                self.url, attempt, self.config.max_attempts
            );

            match self.attempt(&user_agent).await? {
                Ok(body) => {
                    info!("Fetched {} ({} bytes)", self.url, body.len());
                    return Ok(body);
                }
                Err(failure) => {
                    warn!(
                        "fetch: attempt {}/{} for {} failed: {}",
                        attempt, self.config.max_attempts, self.url, failure
                    );
                    last_failure = failure;
                }
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(backoff.delay_after(attempt)).await;
            }
        }

        Err(Error::fetch(
            self.url.clone(),
            self.config.max_attempts,
            last_failure,
        ))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_default_config() {
        let source = HttpPageSource::new("https://example.test/ranking", FetchConfig::default())
            .unwrap();
        assert_eq!(source.url(), "https://example.test/ranking");
        assert_eq!(source.describe(), "https://example.test/ranking");
    }

    #[tokio::test]
    async fn test_unreachable_host_exhausts_attempts() {
        let config = FetchConfig {
            max_attempts: 2,
            initial_backoff_ms: 1,
            jitter_min_ms: 0,
            jitter_max_ms: 0,
            timeout_secs: 2,
            ..FetchConfig::default()
        };
        // Port 9 on loopback refuses connections
        let source = HttpPageSource::new("http://127.0.0.1:9/ranking", config).unwrap();

        match source.fetch().await {
            Err(Error::Fetch { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected fetch exhaustion, got {:?}", other),
        }
    }
}
