//! Client for the live routing service's internal snapshot endpoint.
//!
//! The payload's internal structure (broadcaster/listener topology) is
//! opaque here; on success it is relayed verbatim.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// Shared token header expected by the live routing service.
const LIVE_TOKEN_HEADER: &str = "x-audix-live-token";

/// Longest body excerpt carried in a diagnostic error.
const EXCERPT_LEN: usize = 120;

#[derive(Debug, Error)]
pub enum LiveError {
    /// The upstream answered with something that is not JSON.
    #[error("Bad snapshot response (status {status}): {excerpt}")]
    BadSnapshot { status: u16, excerpt: String },

    /// The upstream answered with JSON but declined the request.
    #[error("{0}")]
    Declined(String),

    /// The upstream could not be reached or timed out.
    #[error("Live routing request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct LiveRoutingClient {
    client: Client,
    base_url: String,
    token: String,
}

impl LiveRoutingClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetches the live-activity snapshot. The declared content type must be
    /// JSON before any parsing is attempted; anything else fails with
    /// [`LiveError::BadSnapshot`] carrying the status and a truncated body
    /// excerpt for diagnostics.
    pub async fn fetch_snapshot(&self) -> Result<Value, LiveError> {
        let url = format!("{}/api/internal/live-snapshot", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(LIVE_TOKEN_HEADER, &self.token)
            .send()
            .await?;

        let status = response.status();

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if !is_json {
            let body = response.text().await.unwrap_or_default();
            return Err(LiveError::BadSnapshot {
                status: status.as_u16(),
                excerpt: truncate_excerpt(&body),
            });
        }

        let payload: Value = response.json().await?;

        let declared_ok = payload
            .get("ok")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if !status.is_success() || !declared_ok {
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .map_or_else(|| format!("UPSTREAM_{}", status.as_u16()), String::from);
            return Err(LiveError::Declined(message));
        }

        Ok(payload)
    }
}

fn truncate_excerpt(body: &str) -> String {
    body.chars().take(EXCERPT_LEN).collect()
}
