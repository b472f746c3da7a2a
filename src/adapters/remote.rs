//! Remote call client.
//!
//! Issues one outbound HTTP request to a named upstream with independent
//! connect and response timeouts, and classifies every failure into the
//! `CallError` taxonomy. No retries and no circuit logic live here.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

use super::CallContext;
use crate::config::TargetConfig;
use crate::error::{CallError, CallResult, FlujoError, Result};

/// Longest upstream body excerpt kept in an error message
const MAX_ERROR_BODY: usize = 256;

#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    target: String,
    base_url: String,
}

impl RemoteClient {
    pub fn new(target: &str, config: &TargetConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("flujo/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout())
            .timeout(config.response_timeout())
            .build()
            .map_err(FlujoError::Http)?;

        Ok(Self {
            http,
            target: target.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: Option<&CallContext>,
    ) -> CallResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();

        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(context) = context {
            request = context.apply_to(request);
        }

        debug!(target_service = %self.target, %url, "remote call");

        let resp = request
            .send()
            .await
            .map_err(|e| self.classify(e, started.elapsed()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| self.classify(e, started.elapsed()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(CallError::NotFound {
                target: self.target.clone(),
                resource: path.to_string(),
            });
        }

        if !status.is_success() {
            return Err(CallError::Unavailable {
                target: self.target.clone(),
                status: Some(status.as_u16()),
                message: truncate(&text, MAX_ERROR_BODY),
            });
        }

        debug!(
            target_service = %self.target,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "remote call completed"
        );

        serde_json::from_str(&text).map_err(|e| CallError::InvalidResponse {
            target: self.target.clone(),
            message: e.to_string(),
        })
    }

    /// Map a transport error onto the call taxonomy. Connect failures are
    /// checked first so a connect timeout is always a `ConnectionError`.
    fn classify(&self, err: reqwest::Error, elapsed: Duration) -> CallError {
        let target = self.target.clone();

        if err.is_connect() {
            CallError::ConnectionError {
                target,
                message: err.to_string(),
            }
        } else if err.is_timeout() {
            CallError::Timeout {
                target,
                elapsed_ms: elapsed.as_millis() as u64,
            }
        } else if err.is_decode() {
            CallError::InvalidResponse {
                target,
                message: err.to_string(),
            }
        } else {
            CallError::Unavailable {
                target,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
