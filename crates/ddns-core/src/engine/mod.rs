//! Core DDNS engine
//!
//! The DdnsEngine runs one reconciliation cycle at a time:
//! - Reloading configuration from its `ConfigSource`
//! - Resolving the public IP once via `IpSource`
//! - Planning each record against the provider's live record sets
//! - Upserting records whose values differ
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐
//! │ ConfigSource │   │  IpSource   │
//! └──────────────┘   └─────────────┘
//!        │  Config          │  IpAddr
//!        └────────┬─────────┘
//!                 ▼
//!          ┌──────────────┐      ┌─────────────┐
//!          │ DdnsEngine   │─────▶│   planner   │
//!          └──────────────┘      └─────────────┘
//!                 │ list / replace
//!                 ▼
//!          ┌──────────────┐
//!          │ DnsProvider  │
//!          └──────────────┘
//! ```
//!
//! ## Failure Isolation
//!
//! Nothing returns an error past [`DdnsEngine::run_cycle`]. Failures that stop
//! the whole cycle become a [`CycleOutcome`] variant; failures of one record
//! become a [`RecordStatus::Failed`] or [`RecordStatus::Invalid`] entry and the
//! remaining records are still processed.

pub mod scheduler;

use crate::config::{Config, ConfigSource, RecordSpec, RecordTarget};
use crate::error::Result;
use crate::planner::{self, Plan};
use crate::traits::{DnsProvider, DnsProviderFactory, IpSource, UpsertRequest};
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

pub use scheduler::{Cycle, Scheduler, Sleeper, TokioSleeper};

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Configuration could not be loaded
    ConfigUnavailable(String),

    /// Configuration has no API key
    MissingApiKey,

    /// Configuration lists no records
    NoRecords,

    /// Every IP lookup failed
    IpUnresolved(String),

    /// The provider client could not be built
    ProviderUnavailable(String),

    /// Records were processed (individually successful or not)
    Reconciled {
        /// IP resolved for this cycle
        ip: IpAddr,
        /// One report per configured record, in configuration order
        records: Vec<RecordReport>,
    },
}

impl CycleOutcome {
    /// Reports for the processed records; empty if the cycle was skipped
    pub fn records(&self) -> &[RecordReport] {
        match self {
            CycleOutcome::Reconciled { records, .. } => records,
            _ => &[],
        }
    }
}

/// What happened to one configured record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    /// Zone as configured
    pub zone: Option<String>,
    /// Name as configured
    pub name: Option<String>,
    /// Fully-qualified name, when the record was valid
    pub full_name: Option<String>,
    /// Outcome
    pub status: RecordStatus,
}

/// Per-record outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Already pointed at the current IP
    Unchanged,
    /// Record set did not exist and was created
    Created,
    /// Record set was replaced
    Replaced {
        /// Values before the replace
        previous: Vec<String>,
    },
    /// Dry run: nothing was sent to the provider
    DryRun,
    /// Entry is missing a zone or name (or is otherwise unusable)
    Invalid(String),
    /// Provider or network failure for this record
    Failed(String),
}

/// Core DDNS engine
///
/// Holds no state between cycles: configuration, IP and provider client are
/// all rebuilt by each call to [`DdnsEngine::run_cycle`].
pub struct DdnsEngine {
    /// Where configuration is re-read from every cycle
    config_source: Box<dyn ConfigSource>,

    /// Public IP discovery
    ip_source: Box<dyn IpSource>,

    /// Builds an authenticated provider from the cycle's API key
    provider_factory: Box<dyn DnsProviderFactory>,

    /// Log intended actions only; never contact the provider
    dry_run: bool,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    pub fn new(
        config_source: Box<dyn ConfigSource>,
        ip_source: Box<dyn IpSource>,
        provider_factory: Box<dyn DnsProviderFactory>,
        dry_run: bool,
    ) -> Self {
        Self {
            config_source,
            ip_source,
            provider_factory,
            dry_run,
        }
    }

    /// Load fresh configuration and reconcile every record once
    pub async fn run_cycle(&self) -> CycleOutcome {
        let config = match self.config_source.load() {
            Ok(config) => config,
            Err(e) => {
                error!("Error loading configuration: {}", e);
                return CycleOutcome::ConfigUnavailable(e.to_string());
            }
        };

        self.reconcile(&config).await
    }

    /// Reconcile every record in `config` once
    pub async fn reconcile(&self, config: &Config) -> CycleOutcome {
        let Some(api_key) = config.api_key() else {
            error!("gcore_api_key not found in config.");
            return CycleOutcome::MissingApiKey;
        };

        if config.records.is_empty() {
            warn!("No records configured to update.");
            return CycleOutcome::NoRecords;
        }

        let ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                error!("Could not determine public IP. Skipping update: {}", e);
                return CycleOutcome::IpUnresolved(e.to_string());
            }
        };
        info!(%ip, "Current public IP: {}", ip);

        let provider = if self.dry_run {
            info!("[DRY RUN] No actual API calls will be made to the DNS provider.");
            None
        } else {
            match self.provider_factory.create(api_key) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    error!("Failed to create DNS provider client: {}", e);
                    return CycleOutcome::ProviderUnavailable(e.to_string());
                }
            }
        };

        let desired = ip.to_string();
        let mut records = Vec::with_capacity(config.records.len());
        for spec in &config.records {
            records.push(self.reconcile_record(spec, &desired, provider.as_deref()).await);
        }

        CycleOutcome::Reconciled { ip, records }
    }

    /// Process one configured record; never fails past this boundary
    async fn reconcile_record(
        &self,
        spec: &RecordSpec,
        desired: &str,
        provider: Option<&dyn DnsProvider>,
    ) -> RecordReport {
        let mut report = RecordReport {
            zone: spec.zone.clone(),
            name: spec.name.clone(),
            full_name: None,
            status: RecordStatus::DryRun,
        };

        let target = match spec.target() {
            Ok(target) => target,
            Err(e) => {
                error!(
                    zone = spec.zone.as_deref().unwrap_or("<missing>"),
                    record = spec.name.as_deref().unwrap_or("<missing>"),
                    record_type = %spec.record_type,
                    ip = %desired,
                    "Invalid record configuration: {}",
                    e
                );
                report.status = RecordStatus::Invalid(e.to_string());
                return report;
            }
        };
        report.full_name = Some(target.full_name.clone());

        info!(
            zone = %target.zone,
            record = %target.full_name,
            record_type = %target.record_type,
            ip = %desired,
            "Checking {} record for {}...",
            target.record_type,
            target.full_name
        );

        let Some(provider) = provider else {
            info!(
                zone = %target.zone,
                record = %target.full_name,
                record_type = %target.record_type,
                ip = %desired,
                "[DRY RUN] Would check and update {} to {}",
                target.full_name,
                desired
            );
            return report;
        };

        report.status = match self.apply(provider, &target, desired).await {
            Ok(status) => status,
            Err(e) => {
                error!(
                    zone = %target.zone,
                    record = %target.full_name,
                    record_type = %target.record_type,
                    ip = %desired,
                    "Error updating record {} in zone {}: {}",
                    target.name,
                    target.zone,
                    e
                );
                RecordStatus::Failed(e.to_string())
            }
        };
        report
    }

    /// Fetch, plan and (if needed) upsert one record
    async fn apply(
        &self,
        provider: &dyn DnsProvider,
        target: &RecordTarget,
        desired: &str,
    ) -> Result<RecordStatus> {
        let existing = provider.list_rrsets(&target.zone).await?;
        debug!(
            zone = %target.zone,
            record = %target.full_name,
            record_type = %target.record_type,
            ip = %desired,
            "Fetched {} record set(s) from {}",
            existing.len(),
            provider.provider_name()
        );

        let plan = planner::plan(&target.full_name, &target.record_type, desired, &existing);
        let status = match plan {
            Plan::Skip => {
                info!(
                    zone = %target.zone,
                    record = %target.full_name,
                    record_type = %target.record_type,
                    ip = %desired,
                    "Record {} is already up to date ({}).",
                    target.full_name,
                    desired
                );
                return Ok(RecordStatus::Unchanged);
            }
            Plan::Create => {
                info!(
                    zone = %target.zone,
                    record = %target.full_name,
                    record_type = %target.record_type,
                    ip = %desired,
                    "Record {} does not exist. Creating...",
                    target.full_name
                );
                RecordStatus::Created
            }
            Plan::Replace { current } => {
                info!(
                    zone = %target.zone,
                    record = %target.full_name,
                    record_type = %target.record_type,
                    ip = %desired,
                    "Record {} needs update. Current values: {:?}",
                    target.full_name,
                    current
                );
                RecordStatus::Replaced { previous: current }
            }
        };

        let request = UpsertRequest::single(
            target.zone.clone(),
            target.full_name.clone(),
            target.record_type.clone(),
            target.ttl,
            desired,
        );
        provider.replace_rrset(&request).await?;

        info!(
            zone = %target.zone,
            record = %target.full_name,
            record_type = %target.record_type,
            ip = %desired,
            "Successfully updated {} to {}",
            target.full_name,
            desired
        );
        Ok(status)
    }
}
