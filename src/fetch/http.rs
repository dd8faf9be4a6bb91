use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::time::Duration;

use super::{Fetcher, Response};
use crate::error::TransportError;

const USER_AGENT: &str = concat!("timemap2git/", env!("CARGO_PKG_VERSION"));

/// Real network [`Fetcher`] backed by a pooled `reqwest` blocking client.
///
/// Redirect following is disabled; 3xx responses are returned as they are.
/// Requests never time out unless [`HttpFetcher::with_timeout`] sets a limit.
pub struct HttpFetcher {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// Limits every request (connect, headers and body) to `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn connection_error(url: &str, err: reqwest::Error) -> TransportError {
        TransportError::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn get(&self, url: &str) -> Result<Response, TransportError> {
        let reply = self
            .client
            .get(url)
            .send()
            .map_err(|e| Self::connection_error(url, e))?;

        let mut response = Response::new(url, reply.status().as_u16());
        for (name, value) in reply.headers() {
            // Non-UTF-8 header values cannot carry anything we interpret
            if let Ok(value) = value.to_str() {
                response = response.with_header(name.as_str(), value);
            }
        }

        let body = reply
            .bytes()
            .map_err(|e| Self::connection_error(url, e))?;

        Ok(response.with_body(body.to_vec()))
    }
}
