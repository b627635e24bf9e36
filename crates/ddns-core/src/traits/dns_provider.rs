// # DNS Provider Trait
//
// Defines the interface for reading and replacing record sets via a provider API.
//
// ## Implementations
//
// - Gcore DNS: `ddns-provider-gcore` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{DnsProvider, UpsertRequest};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let existing = provider.list_rrsets("example.com").await?;
//
//     provider.replace_rrset(&UpsertRequest::single(
//         "example.com", "home.example.com", "A", 300, "203.0.113.5",
//     )).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content of a single resource record
///
/// Providers return either a scalar or a list of values depending on the
/// record type; both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordContent {
    /// A list of values (e.g. `["203.0.113.5"]`, or `[10, "mx.example.com"]`)
    Many(Vec<Value>),
    /// A single value
    One(Value),
}

impl RecordContent {
    /// Flatten the content into an ordered list of strings
    ///
    /// Strings are taken verbatim; any other JSON value uses its JSON text.
    pub fn values(&self) -> Vec<String> {
        match self {
            RecordContent::One(value) => vec![value_to_string(value)],
            RecordContent::Many(values) => values.iter().map(value_to_string).collect(),
        }
    }

    /// The content as a list, for wire formats that only accept lists
    pub fn to_list(&self) -> Vec<Value> {
        match self {
            RecordContent::One(value) => vec![value.clone()],
            RecordContent::Many(values) => values.clone(),
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One resource record inside a record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Record content
    pub content: RecordContent,
}

impl ResourceRecord {
    /// A resource record holding one string value
    pub fn single(value: impl Into<String>) -> Self {
        Self {
            content: RecordContent::One(Value::String(value.into())),
        }
    }
}

/// A record set as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrSet {
    /// Fully-qualified name, possibly with a trailing dot
    pub name: String,

    /// Record type (e.g. "A")
    #[serde(rename = "type")]
    pub record_type: String,

    /// TTL, when the provider reports one
    #[serde(default)]
    pub ttl: Option<u32>,

    /// Resource records in provider order
    #[serde(default)]
    pub resource_records: Vec<ResourceRecord>,
}

impl RrSet {
    /// Build a record set holding the given string values
    pub fn new(name: impl Into<String>, record_type: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl: None,
            resource_records: values.iter().map(|v| ResourceRecord::single(*v)).collect(),
        }
    }

    /// All content values across the resource records, flattened in order
    pub fn values(&self) -> Vec<String> {
        self.resource_records
            .iter()
            .flat_map(|rr| rr.content.values())
            .collect()
    }
}

/// A request to create or fully replace one record set
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    /// Zone name
    pub zone: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type
    pub record_type: String,
    /// TTL in seconds
    pub ttl: u32,
    /// The complete new value set
    pub resource_records: Vec<ResourceRecord>,
}

impl UpsertRequest {
    /// A request that collapses the record set to one value
    pub fn single(
        zone: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            record_type: record_type.into(),
            ttl,
            resource_records: vec![ResourceRecord::single(value)],
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses into typed structures
/// - ✅ Return success or failure (the next cycle is the retry)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff
/// - ❌ Decide whether an update is needed (owned by the planner)
/// - ❌ Delete records or touch record types it was not asked about
/// - ❌ Cache state beyond a single request
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the record sets currently in `zone`
    async fn list_rrsets(&self, zone: &str) -> Result<Vec<RrSet>, crate::Error>;

    /// Create or fully replace a record set
    ///
    /// Must be idempotent: sending the same request twice leaves the same state.
    async fn replace_rrset(&self, request: &UpsertRequest) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers
///
/// The API key is re-read with the configuration on every cycle, so the
/// engine asks for a fresh provider each time.
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider authenticated with `api_key`
    fn create(&self, api_key: &str) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
