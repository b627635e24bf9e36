// # HTTP IP Source
//
// This crate provides the public IP resolver for the DDNS system.
//
// ## Behaviour
//
// Queries an ordered list of lookup services and returns the address from the
// first one that answers with something usable. Any failure (network error,
// timeout, non-2xx status, unreadable body, missing or unparsable IP field)
// moves on to the next service. A service is never retried within one call;
// the next service is the retry.
//
// Bodies are read as JSON objects holding the address under `ip`, `ip_addr`
// or `query`. Plain-text bodies holding just the address are accepted too.

use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default IP lookup services, tried in order
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org?format=json",
    "https://ifconfig.me/all.json",
    "https://ipapi.co/json/",
];

/// JSON keys that may hold the address, in order of preference
const IP_KEYS: &[&str] = &["ip", "ip_addr", "query"];

/// HTTP-based IP source with ordered fallback across services
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Lookup services, tried strictly in order
    urls: Vec<String>,

    /// HTTP client (carries the per-request timeout)
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source using [`DEFAULT_IP_SERVICES`]
    pub fn new() -> Result<Self> {
        Self::with_services(DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect())
    }

    /// Create a source over custom services
    pub fn with_services(urls: Vec<String>) -> Result<Self> {
        Self::with_timeout(urls, DEFAULT_TIMEOUT)
    }

    /// Create a source over custom services with a custom timeout
    pub fn with_timeout(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(urls, client)
    }

    /// Create a source over custom services with a preconfigured client
    pub fn with_client(urls: Vec<String>, client: reqwest::Client) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::config("at least one IP lookup service is required"));
        }
        Ok(Self { urls, client })
    }

    /// The services this source queries, in order
    pub fn services(&self) -> &[String] {
        &self.urls
    }

    /// Fetch and parse the IP from one service
    async fn fetch_ip(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        extract_ip(&body).ok_or_else(|| {
            Error::ip_source(format!("No IP address in response: {}", truncate(&body, 120)))
        })
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        for url in &self.urls {
            match self.fetch_ip(url).await {
                Ok(ip) => {
                    tracing::debug!(service = %url, %ip, "Resolved public IP");
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!(service = %url, "IP lookup failed, trying next service: {}", e);
                }
            }
        }

        Err(Error::not_found(format!(
            "none of {} IP lookup service(s) returned an address",
            self.urls.len()
        )))
    }
}

/// Extract an IP address from a lookup service response body
///
/// JSON objects are searched for `ip`, `ip_addr` and `query` in that order;
/// the first non-empty string wins and must parse as an address. A body that
/// is not JSON is parsed as a bare address.
pub fn extract_ip(body: &str) -> Option<IpAddr> {
    let body = body.trim();
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => IP_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .and_then(|value| value.parse().ok()),
        Ok(_) => None,
        Err(_) => body.parse().ok(),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
