//! HTTP transport for the v.qq.com resolver
//!
//! Thin wrapper over `reqwest` carrying the session's user agent, optional
//! proxy and timeout. Requests are best-effort: a non-200 status is "no
//! data", not an error, and nothing is retried.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;

use crate::error::{QQVideoError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Optional proxy URL applied to all requests
    pub proxy: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            proxy: None,
            timeout_secs: 30,
        }
    }
}

/// Pre-built cookie sets supplied by the caller
///
/// The site hands out a regular and an elevated-privilege token; the
/// elevated set wins whenever it is non-empty. Values are ready-to-send
/// `Cookie` header strings (`key=value; key=value`).
#[derive(Debug, Clone, Default)]
pub struct UserTokens {
    pub regular: String,
    pub vip: String,
}

impl UserTokens {
    pub fn new(regular: impl Into<String>, vip: impl Into<String>) -> Self {
        Self {
            regular: regular.into(),
            vip: vip.into(),
        }
    }

    /// The cookie set to send, preferring the elevated one
    pub fn active(&self) -> Option<&str> {
        if !self.vip.is_empty() {
            Some(&self.vip)
        } else if !self.regular.is_empty() {
            Some(&self.regular)
        } else {
            None
        }
    }
}

/// HTTP client wrapper used by every fetch in the pipeline
#[derive(Debug)]
pub struct QQVideoClient {
    client: reqwest::Client,
}

impl QQVideoClient {
    /// Creates a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .cookie_store(true)
            .default_headers(headers);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| QQVideoError::Config(format!("bad proxy {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(QQVideoError::Http)?;
        Ok(Self { client })
    }

    /// Fetches a URL and returns the body text
    ///
    /// `query` entries are appended as URL parameters, `cookies` as a
    /// per-request `Cookie` header. Any non-200 status yields `Ok(None)`;
    /// only transport-level failures surface as errors.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        cookies: Option<&str>,
    ) -> Result<Option<String>> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(cookie) = cookies
            && let Ok(value) = HeaderValue::from_str(cookie)
        {
            request = request.header(header::COOKIE, value);
        }

        let response = request.send().await.map_err(QQVideoError::Http)?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, url, "dropping non-200 response");
            return Ok(None);
        }

        let body = response.text().await.map_err(QQVideoError::Http)?;
        Ok(Some(body))
    }
}
