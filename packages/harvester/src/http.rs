//! HTTP client wrapper for the IERS data center.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_LENGTH;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("iers-harvester/", env!("CARGO_PKG_VERSION"));

/// Maximum number of attempts for transient download failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Declared body size of a response.
///
/// Read from the header itself: reqwest reports no length for bodiless
/// HEAD responses.
pub fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Download a document with retry on transient failures.
///
/// Server errors (5xx), connection failures and timeouts are retried with
/// exponential backoff. Any other non-success status is returned at once
/// as [`HarvesterError::Transport`].
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to download from
///
/// # Returns
/// Raw bytes of the response body
pub fn download_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let mut last_error: Option<String> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // 500ms, 1000ms
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay, "Retrying after delay");
            thread::sleep(Duration::from_millis(delay));
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        %url,
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("server error: {status}"));
                    continue;
                }

                if !status.is_success() {
                    return Err(HarvesterError::Transport {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                return Ok(response.bytes()?.to_vec());
            }
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!(
                    %url,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    "Connection error, will retry"
                );
                last_error = Some(e.to_string());
            }
            Err(e) => return Err(HarvesterError::Http(e)),
        }
    }

    Err(HarvesterError::RetriesExhausted {
        attempts: MAX_RETRIES,
        message: last_error.unwrap_or_else(|| "unknown error".to_string()),
    })
}
