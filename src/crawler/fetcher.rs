//! HTTP fetcher implementation
//!
//! This module handles single HTTP requests for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests with redirects left to the caller
//! - Classification of the response into a [`FetchOutcome`]

use crate::config::UserAgentConfig;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Result of one GET request
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 2xx HTML page, body exactly as served
    Success {
        status: u16,
        content_type: String,
        body: Vec<u8>,
    },

    /// 3xx with a `Location` header (unresolved, as sent by the server)
    Redirect { status: u16, location: String },

    /// Any status >= 400, or a 3xx without a usable `Location`
    HttpError { status: u16 },

    /// The request exceeded the configured timeout
    Timeout,

    /// Connection, DNS, TLS or body read failure
    TransportError { detail: String },

    /// Fetched fine but not something to extract from
    Skipped { status: u16, reason: String },
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client; the scheduler follows them
/// itself so every hop is recorded and bounded by the depth ceiling.
///
/// # Example
///
/// ```no_run
/// use site_auditor::config::UserAgentConfig;
/// use site_auditor::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), 45).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues a single GET and classifies the response
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 3xx with `Location` | `Redirect` |
/// | 3xx without `Location` | `HttpError` |
/// | >= 400 | `HttpError` |
/// | 2xx, not `text/html` | `Skipped` |
/// | 2xx HTML | `Success` |
/// | Timeout | `Timeout` |
/// | Anything else | `TransportError` |
pub async fn fetch_once(client: &Client, url: &str) -> FetchOutcome {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => return classify_error(e),
    };

    let status = response.status();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|l| !l.is_empty());

        return match location {
            Some(location) => FetchOutcome::Redirect {
                status: status.as_u16(),
                location: location.to_string(),
            },
            None => FetchOutcome::HttpError {
                status: status.as_u16(),
            },
        };
    }

    if status.as_u16() >= 400 {
        return FetchOutcome::HttpError {
            status: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.to_ascii_lowercase().contains("text/html") {
        return FetchOutcome::Skipped {
            status: status.as_u16(),
            reason: format!("Expected HTML, got '{}'", content_type),
        };
    }

    match response.bytes().await {
        Ok(body) => FetchOutcome::Success {
            status: status.as_u16(),
            content_type,
            body: body.to_vec(),
        },
        Err(e) => classify_error(e),
    }
}

fn classify_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::TransportError {
            detail: format!("Connection failed: {}", e),
        }
    } else {
        FetchOutcome::TransportError {
            detail: e.to_string(),
        }
    }
}
