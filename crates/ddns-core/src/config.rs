//! Configuration types for the DDNS system
//!
//! The configuration is a small YAML document that is re-read at the start of
//! every reconciliation cycle, so edits on disk take effect without a restart.
//!
//! ```yaml
//! gcore_api_key: "..."
//! interval_minutes: 5
//! records:
//!   - zone: example.com
//!     name: "@"
//!   - zone: example.com
//!     name: home
//!     type: A
//!     ttl: 120
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "GCORE_CONFIG_PATH";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main DDNS configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Gcore API key
    ///
    /// Optional at the parse layer: a missing key skips the cycle instead of
    /// failing the whole document.
    #[serde(default, deserialize_with = "scalar_string")]
    pub gcore_api_key: Option<String>,

    /// Minutes between reconciliation cycles
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// DNS records to manage, in order
    #[serde(default)]
    pub records: Vec<RecordSpec>,
}

impl Config {
    /// Parse a configuration document
    ///
    /// An empty or `null` document is rejected.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Err(Error::config("configuration document is empty"));
        }
        Ok(serde_yaml::from_value(value)?)
    }

    /// The API key, if present and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.gcore_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// The cycle interval
    pub fn interval(&self) -> Result<Duration> {
        if self.interval_minutes == 0 {
            return Err(Error::config("interval_minutes must be > 0"));
        }
        self.interval_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                Error::config(format!(
                    "interval_minutes is too large: {}",
                    self.interval_minutes
                ))
            })
    }
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = self.gcore_api_key.as_ref().map(|_| "<REDACTED>");
        f.debug_struct("Config")
            .field("gcore_api_key", &api_key)
            .field("interval_minutes", &self.interval_minutes)
            .field("records", &self.records)
            .finish()
    }
}

fn default_interval_minutes() -> u64 {
    5
}

/// Accept any YAML scalar as a string; `null` is `None`
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        other => scalar_text(&other)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a string")),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One DNS record to keep pointed at the public IP
///
/// Deserialization never fails: scalars of any kind are accepted for the
/// text fields, and an entry with unusable fields is kept but reported as
/// invalid by [`RecordSpec::target`]. One bad entry must not cost the rest of
/// the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSpec {
    /// Zone the record lives in (e.g. "example.com")
    pub zone: Option<String>,

    /// Record name relative to the zone; "@" is the apex, "*" the wildcard
    pub name: Option<String>,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// Why the entry could not be read, if it couldn't
    #[serde(skip)]
    problem: Option<String>,
}

impl<'de> Deserialize<'de> for RecordSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_yaml_value(&value))
    }
}

impl RecordSpec {
    /// Create a record spec with the default type and TTL
    pub fn new(zone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
            name: Some(name.into()),
            record_type: default_record_type(),
            ttl: default_ttl(),
            problem: None,
        }
    }

    /// Read one `records` entry, collecting field errors instead of failing
    fn from_yaml_value(value: &Value) -> Self {
        let mut spec = Self {
            zone: None,
            name: None,
            record_type: default_record_type(),
            ttl: default_ttl(),
            problem: None,
        };

        let Some(map) = value.as_mapping() else {
            spec.problem = Some("record entry is not a mapping".to_string());
            return spec;
        };

        let mut problems = Vec::new();
        match text_field(map, "zone") {
            Ok(zone) => spec.zone = zone,
            Err(e) => problems.push(e),
        }
        match text_field(map, "name") {
            Ok(name) => spec.name = name,
            Err(e) => problems.push(e),
        }
        match text_field(map, "type") {
            Ok(Some(record_type)) => spec.record_type = record_type,
            Ok(None) => {}
            Err(e) => problems.push(e),
        }
        match ttl_field(map) {
            Ok(Some(ttl)) => spec.ttl = ttl,
            Ok(None) => {}
            Err(e) => problems.push(e),
        }

        if !problems.is_empty() {
            spec.problem = Some(problems.join("; "));
        }
        spec
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = record_type.into();
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate this entry and resolve its fully-qualified name
    pub fn target(&self) -> Result<RecordTarget> {
        if let Some(problem) = &self.problem {
            return Err(Error::invalid_input(format!("{}: {}", problem, self)));
        }
        let zone = non_empty(self.zone.as_deref())
            .ok_or_else(|| Error::invalid_input(format!("record is missing a zone: {}", self)))?;
        let name = non_empty(self.name.as_deref())
            .ok_or_else(|| Error::invalid_input(format!("record is missing a name: {}", self)))?;

        if self.record_type.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "record has an empty type: {}",
                self
            )));
        }
        if self.ttl == 0 {
            return Err(Error::invalid_input(format!("record ttl must be > 0: {}", self)));
        }

        Ok(RecordTarget {
            zone: zone.to_string(),
            name: name.to_string(),
            full_name: full_name(zone, name),
            record_type: self.record_type.clone(),
            ttl: self.ttl,
        })
    }
}

impl std::fmt::Display for RecordSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{zone: {}, name: {}, type: {}, ttl: {}}}",
            self.zone.as_deref().unwrap_or("<missing>"),
            self.name.as_deref().unwrap_or("<missing>"),
            self.record_type,
            self.ttl
        )
    }
}

fn text_field(map: &Mapping, key: &str) -> std::result::Result<Option<String>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_text(value)
            .map(Some)
            .ok_or_else(|| format!("`{}` must be a plain value", key)),
    }
}

fn ttl_field(map: &Mapping) -> std::result::Result<Option<u32>, String> {
    let ttl = match map.get("ttl") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().and_then(|t| u32::try_from(t).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    ttl.map(Some)
        .ok_or_else(|| "`ttl` must be a whole number of seconds".to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_ttl() -> u32 {
    300
}

/// A validated record, ready to be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Zone name
    pub zone: String,
    /// Name as configured ("@", "*", or a label)
    pub name: String,
    /// Fully-qualified record name
    pub full_name: String,
    /// Record type
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

/// Derive the fully-qualified record name for `name` inside `zone`
pub fn full_name(zone: &str, name: &str) -> String {
    match name {
        "@" => zone.to_string(),
        "*" => format!("*.{}", zone),
        _ => format!("{}.{}", name, zone),
    }
}

/// Something that can produce a fresh [`Config`]
///
/// Called once per cycle; implementations must not cache across calls.
pub trait ConfigSource: Send + Sync {
    /// Load the current configuration
    fn load(&self) -> Result<Config>;
}

/// Configuration read from a YAML file on every call
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    /// Read configuration from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `GCORE_CONFIG_PATH`, falling back to `config.yaml`
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::new(path)
    }

    /// The file this source reads
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<Config> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(format!(
                    "configuration file {} not found",
                    self.path.display()
                ))
            } else {
                Error::config(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                ))
            }
        })?;

        Config::from_yaml_str(&text).map_err(|e| {
            Error::config(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }
}
