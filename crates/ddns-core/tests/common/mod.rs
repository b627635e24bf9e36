//! Test doubles and common utilities for the reconciliation contract tests
//!
//! These doubles count calls and record requests without any network I/O.

#![allow(dead_code)]

use ddns_core::config::{Config, ConfigSource, RecordSpec};
use ddns_core::engine::{Cycle, CycleOutcome, Sleeper};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsProviderFactory, IpSource, RrSet, UpsertRequest};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// A config source returning a fixed configuration (or a fixed failure)
pub struct StaticConfigSource {
    config: Option<Config>,
    load_count: Arc<AtomicUsize>,
}

impl StaticConfigSource {
    pub fn new(config: Config) -> Self {
        Self {
            config: Some(config),
            load_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            config: None,
            load_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<Config> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.config
            .clone()
            .ok_or_else(|| Error::config("configuration file config.yaml not found"))
    }
}

/// An IP source that always returns the same address
pub struct StaticIpSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip,
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }
}

/// An IP source for which every lookup fails
pub struct UnreachableIpSource;

#[async_trait::async_trait]
impl IpSource for UnreachableIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::not_found("no IP lookup service answered"))
    }
}

/// Shared state behind every MockDnsProvider built by one factory
#[derive(Default)]
struct ProviderState {
    zones: HashMap<String, Vec<RrSet>>,
    failing_zones: HashSet<String>,
    list_calls: Vec<String>,
    upserts: Vec<UpsertRequest>,
}

/// A mock DnsProvider that serves canned record sets and records upserts
///
/// Upserts are applied to the canned state, so a second cycle sees the
/// result of the first.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rrsets` when `zone` is listed
    pub fn with_zone(self, zone: &str, rrsets: Vec<RrSet>) -> Self {
        self.state
            .lock()
            .unwrap()
            .zones
            .insert(zone.to_string(), rrsets);
        self
    }

    /// Fail every call touching `zone`
    pub fn failing_zone(self, zone: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_zones
            .insert(zone.to_string());
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.state.lock().unwrap().list_calls.len()
    }

    pub fn listed_zones(&self) -> Vec<String> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn upserts(&self) -> Vec<UpsertRequest> {
        self.state.lock().unwrap().upserts.clone()
    }

    /// Total number of calls of any kind
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.list_calls.len() + state.upserts.len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_rrsets(&self, zone: &str) -> Result<Vec<RrSet>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push(zone.to_string());
        if state.failing_zones.contains(zone) {
            return Err(Error::provider("mock", format!("zone {} unavailable", zone)));
        }
        Ok(state.zones.get(zone).cloned().unwrap_or_default())
    }

    async fn replace_rrset(&self, request: &UpsertRequest) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_zones.contains(&request.zone) {
            return Err(Error::provider("mock", "replace rejected"));
        }
        state.upserts.push(request.clone());

        let rrsets = state.zones.entry(request.zone.clone()).or_default();
        rrsets.retain(|r| {
            !(r.record_type == request.record_type
                && r.name.trim_end_matches('.') == request.name.trim_end_matches('.'))
        });
        rrsets.push(RrSet {
            name: request.name.clone(),
            record_type: request.record_type.clone(),
            ttl: Some(request.ttl),
            resource_records: request.resource_records.clone(),
        });
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A factory handing out providers that share one MockDnsProvider's state
pub struct MockProviderFactory {
    provider: MockDnsProvider,
    create_count: Arc<AtomicUsize>,
    api_keys: Arc<Mutex<Vec<String>>>,
    failures_left: Arc<AtomicUsize>,
}

impl MockProviderFactory {
    pub fn new(provider: &MockDnsProvider) -> Self {
        Self {
            provider: provider.clone(),
            create_count: Arc::new(AtomicUsize::new(0)),
            api_keys: Arc::new(Mutex::new(Vec::new())),
            failures_left: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A factory whose first `failures` calls to `create` return an error
    pub fn failing_first(provider: &MockDnsProvider, failures: usize) -> Self {
        let factory = Self::new(provider);
        factory.failures_left.store(failures, Ordering::SeqCst);
        factory
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().unwrap().clone()
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            provider: other.provider.clone(),
            create_count: Arc::clone(&other.create_count),
            api_keys: Arc::clone(&other.api_keys),
            failures_left: Arc::clone(&other.failures_left),
        }
    }
}

impl DnsProviderFactory for MockProviderFactory {
    fn create(&self, api_key: &str) -> Result<Box<dyn DnsProvider>> {
        self.create_count.fetch_add(1, Ordering::SeqCst);
        self.api_keys.lock().unwrap().push(api_key.to_string());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::http("failed to build HTTP client"));
        }
        Ok(Box::new(self.provider.clone()))
    }
}

/// A sleeper that returns immediately and records requested durations
///
/// When built with [`RecordingSleeper::stopping_after`], the Nth sleep fires
/// the shutdown channel and never returns.
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    stop_after: usize,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            sleeps: Arc::new(Mutex::new(Vec::new())),
            stop_after: usize::MAX,
            shutdown: Mutex::new(None),
        }
    }

    pub fn stopping_after(sleeps: usize) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let sleeper = Self {
            sleeps: Arc::new(Mutex::new(Vec::new())),
            stop_after: sleeps,
            shutdown: Mutex::new(Some(tx)),
        };
        (sleeper, rx)
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<Duration>>> {
        Arc::clone(&self.sleeps)
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            sleeps.len()
        };

        if count >= self.stop_after {
            let tx = self.shutdown.lock().unwrap().take();
            if let Some(tx) = tx {
                let _ = tx.send(());
            }
            std::future::pending::<()>().await;
        }
    }
}

/// A cycle that counts invocations and panics on selected ones
pub struct CountingCycle {
    calls: Arc<AtomicUsize>,
    panic_on: HashSet<usize>,
}

impl CountingCycle {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            panic_on: HashSet::new(),
        }
    }

    /// Panic on the given 1-based invocation numbers
    pub fn panicking_on(calls: &[usize]) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            panic_on: calls.iter().copied().collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Cycle for CountingCycle {
    async fn run_cycle(&self) -> CycleOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on.contains(&call) {
            panic!("cycle {} blew up", call);
        }
        CycleOutcome::NoRecords
    }
}

pub const CURRENT_IP: [u8; 4] = [203, 0, 113, 5];

/// Helper to create a minimal Config for testing
pub fn minimal_config(records: Vec<RecordSpec>) -> Config {
    Config {
        gcore_api_key: Some("test-api-key".to_string()),
        interval_minutes: 5,
        records,
    }
}

/// The `{zone: example.com, name: "@", type: A, ttl: 300}` record
pub fn apex_record() -> RecordSpec {
    RecordSpec::new("example.com", "@")
}
