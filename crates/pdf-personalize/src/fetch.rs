//! Remote tail document download with timeout, retry and backoff

use crate::constants::FETCH_USER_AGENT;
use crate::options::FetchOptions;
use crate::types::*;
use log::{info, warn};

/// Downloads tail documents over HTTP(S).
///
/// Each attempt is bounded by the configured timeout; a failed attempt
/// (timeout, transport error or non-2xx status) is followed by a wait of
/// `backoff × 2^(attempt−1)` unless it was the last one.
#[derive(Debug, Clone)]
pub struct RemoteTailFetcher {
    client: reqwest::Client,
    options: FetchOptions,
}

impl RemoteTailFetcher {
    pub fn new(options: FetchOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| PersonalizeError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(client, options)
    }

    pub fn with_client(client: reqwest::Client, options: FetchOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch `url`, surfacing the last attempt's error once all attempts fail
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let attempts = self.options.retries;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.attempt(url).await {
                Ok(bytes) => {
                    info!(
                        "Fetched {} bytes from {} on attempt {}/{}",
                        bytes.len(),
                        url,
                        attempt,
                        attempts
                    );
                    return Ok(bytes);
                }
                Err(e) => {
                    if attempt < attempts {
                        let wait = self.options.backoff_after(attempt);
                        warn!(
                            "Fetch attempt {}/{} for {} failed ({}). Retrying in {}ms...",
                            attempt,
                            attempts,
                            url,
                            e,
                            wait.as_millis()
                        );
                        tokio::time::sleep(wait).await;
                    } else {
                        warn!(
                            "Fetch attempt {}/{} for {} failed ({}). Giving up.",
                            attempt, attempts, url, e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => Err(PersonalizeError::Fetch {
                url: url.to_string(),
                attempts,
                source,
            }),
            None => Err(PersonalizeError::Config(
                "Fetch retries must be at least 1".to_string(),
            )),
        }
    }

    async fn attempt(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let timeout = self.options.timeout();
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status));
            }
            Ok(response.bytes().await?.to_vec())
        };

        // Dropping the request future on timeout cancels the attempt
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
    }
}
