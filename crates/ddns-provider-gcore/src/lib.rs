// # Gcore DNS Provider
//
// This crate provides a Gcore DNS provider implementation for the DDNS system.
//
// ## Behaviour
//
// - ✅ One HTTP request per trait call (list or replace)
// - ✅ Full error propagation to the engine (the next cycle is the retry)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - ✅ Typed response parsing; absent fields are explicit `Option`/defaults
// - ❌ NO retry logic
// - ❌ NO caching
// - ❌ NO deletes: the provider only lists and replaces record sets
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Factory fails fast if the key is empty
//
// ## API Reference
//
// - List record sets: GET `/v2/zones/:zone/rrsets?all=true`
// - Replace record set: PUT `/v2/zones/:zone/:name/:type`
// - Auth header: `Authorization: APIKey <key>`

use async_trait::async_trait;
use ddns_core::traits::{DnsProvider, DnsProviderFactory, RrSet, UpsertRequest};
use ddns_core::{Error, Result};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Gcore DNS API base URL
pub const GCORE_API_BASE: &str = "https://api.gcore.com/dns";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "gcore";

/// Response of the record set listing endpoint
#[derive(Debug, Deserialize)]
struct RrSetListResponse {
    #[serde(default)]
    rrsets: Vec<RrSet>,
    #[serde(default)]
    total_amount: Option<u64>,
}

/// Body of the replace endpoint
#[derive(Debug, Serialize)]
struct ReplaceBody {
    ttl: u32,
    resource_records: Vec<ReplaceRecord>,
}

#[derive(Debug, Serialize)]
struct ReplaceRecord {
    content: Vec<Value>,
}

impl From<&UpsertRequest> for ReplaceBody {
    fn from(request: &UpsertRequest) -> Self {
        Self {
            ttl: request.ttl,
            resource_records: request
                .resource_records
                .iter()
                .map(|rr| ReplaceRecord {
                    content: rr.content.to_list(),
                })
                .collect(),
        }
    }
}

/// Gcore DNS provider
///
/// Stateless and single-shot: every trait call issues exactly one request.
pub struct GcoreProvider {
    /// Gcore API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL
    base_url: Url,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GcoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcoreProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl GcoreProvider {
    /// Create a provider against the public Gcore API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, GCORE_API_BASE)
    }

    /// Create a provider against a custom API base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(api_key, base_url, client)
    }

    /// Create a provider with a preconfigured HTTP client
    pub fn with_client(
        api_key: impl Into<String>,
        base_url: &str,
        client: reqwest::Client,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Gcore API key cannot be empty"));
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid Gcore API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("Invalid Gcore API URL: {}", base_url)));
        }

        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    /// Build an endpoint URL from path segments (each segment is escaped)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn rrsets_url(&self, zone: &str) -> Url {
        let mut url = self.endpoint(&["v2", "zones", zone, "rrsets"]);
        url.query_pairs_mut().append_pair("all", "true");
        url
    }

    fn rrset_url(&self, zone: &str, name: &str, record_type: &str) -> Url {
        self.endpoint(&["v2", "zones", zone, name, record_type])
    }

    fn authorization(&self) -> String {
        format!("APIKey {}", self.api_key)
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, body: &str, what: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid Gcore API key or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(what.to_string()),
        429 => Error::rate_limited(format!(
            "Gcore rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Gcore server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", what, status, body),
        ),
    }
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string())
}

#[async_trait]
impl DnsProvider for GcoreProvider {
    /// List record sets in a zone
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /v2/zones/example.com/rrsets?all=true
    /// Authorization: APIKey <key>
    /// ```
    async fn list_rrsets(&self, zone: &str) -> Result<Vec<RrSet>> {
        let url = self.rrsets_url(zone);
        tracing::debug!(zone = %zone, "Listing Gcore record sets");

        let response = self
            .client
            .get(url)
            .header("Authorization", self.authorization())
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(status_error(status, &body, &format!("Zone {}", zone)));
        }

        let list: RrSetListResponse = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        tracing::debug!(
            zone = %zone,
            "Gcore returned {} record set(s) (total_amount: {:?})",
            list.rrsets.len(),
            list.total_amount
        );
        Ok(list.rrsets)
    }

    /// Create or replace a record set
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /v2/zones/example.com/home.example.com/A
    /// Authorization: APIKey <key>
    /// {
    ///   "ttl": 300,
    ///   "resource_records": [{ "content": ["203.0.113.5"] }]
    /// }
    /// ```
    async fn replace_rrset(&self, request: &UpsertRequest) -> Result<()> {
        let url = self.rrset_url(&request.zone, &request.name, &request.record_type);
        let body = ReplaceBody::from(request);

        tracing::info!(
            zone = %request.zone,
            record = %request.name,
            record_type = %request.record_type,
            "Replacing Gcore record set (ttl: {})",
            request.ttl
        );

        let response = self
            .client
            .put(url)
            .header("Authorization", self.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(status_error(
                status,
                &body,
                &format!("Record set {} {}", request.name, request.record_type),
            ));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Gcore providers
#[derive(Debug, Clone)]
pub struct GcoreFactory {
    base_url: String,
}

impl GcoreFactory {
    /// Factory for the public Gcore API
    pub fn new() -> Self {
        Self::with_base_url(GCORE_API_BASE)
    }

    /// Factory for a custom API base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for GcoreFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsProviderFactory for GcoreFactory {
    fn create(&self, api_key: &str) -> Result<Box<dyn DnsProvider>> {
        Ok(Box::new(GcoreProvider::with_base_url(api_key, &self.base_url)?))
    }
}
