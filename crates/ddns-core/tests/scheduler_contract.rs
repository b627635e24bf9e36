//! Contract Test: Scheduler
//!
//! Constraints verified:
//! - Dry run performs exactly one cycle and never sleeps
//! - Cycles are separated by exactly the configured interval
//! - A panicking cycle does not stop the scheduler
//! - Shutdown is observed between cycles

mod common;

use common::*;
use ddns_core::config::RecordSpec;
use ddns_core::{DdnsEngine, Scheduler};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::test]
async fn dry_run_stops_after_one_cycle_without_sleeping() {
    let cycle = Arc::new(CountingCycle::new());
    let sleeper = RecordingSleeper::new();
    let sleeps = sleeper.handle();

    let scheduler = Scheduler::with_shared(Arc::clone(&cycle), sleeper, INTERVAL, true);
    let started = scheduler.run().await;

    assert_eq!(started, 1);
    assert_eq!(cycle.calls(), 1);
    assert!(sleeps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sleeps_the_configured_interval_between_cycles() {
    let cycle = Arc::new(CountingCycle::new());
    let (sleeper, shutdown) = RecordingSleeper::stopping_after(3);
    let sleeps = sleeper.handle();

    let scheduler = Scheduler::with_shared(Arc::clone(&cycle), sleeper, INTERVAL, false);
    let started = scheduler
        .run_until(async {
            let _ = shutdown.await;
        })
        .await;

    assert_eq!(started, 3);
    assert_eq!(cycle.calls(), 3);
    assert_eq!(*sleeps.lock().unwrap(), vec![INTERVAL; 3]);
}

#[tokio::test]
async fn panicking_cycle_is_contained() {
    let cycle = Arc::new(CountingCycle::panicking_on(&[1, 2]));
    let (sleeper, shutdown) = RecordingSleeper::stopping_after(4);

    let scheduler = Scheduler::with_shared(Arc::clone(&cycle), sleeper, INTERVAL, false);
    let started = scheduler
        .run_until(async {
            let _ = shutdown.await;
        })
        .await;

    assert_eq!(started, 4, "scheduler keeps going after panics");
    assert_eq!(cycle.calls(), 4);
}

#[tokio::test]
async fn panicking_dry_run_still_exits() {
    let cycle = Arc::new(CountingCycle::panicking_on(&[1]));
    let scheduler = Scheduler::with_shared(Arc::clone(&cycle), RecordingSleeper::new(), INTERVAL, true);

    assert_eq!(scheduler.run().await, 1);
}

#[tokio::test]
async fn dry_run_engine_end_to_end() {
    let provider = MockDnsProvider::new();
    let factory = MockProviderFactory::new(&provider);
    let config = minimal_config(vec![apex_record(), RecordSpec::new("example.com", "www")]);
    let config_source = StaticConfigSource::new(config);
    let engine = DdnsEngine::new(
        Box::new(config_source),
        Box::new(StaticIpSource::new(IpAddr::from(CURRENT_IP))),
        Box::new(MockProviderFactory::sharing_counters_with(&factory)),
        true,
    );

    let scheduler = Scheduler::new(engine, RecordingSleeper::new(), INTERVAL, true);

    assert_eq!(scheduler.run().await, 1);
    assert_eq!(factory.create_count(), 0);
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn live_engine_reconciles_every_cycle() {
    let provider = MockDnsProvider::new();
    let factory = MockProviderFactory::new(&provider);
    let engine = DdnsEngine::new(
        Box::new(StaticConfigSource::new(minimal_config(vec![apex_record()]))),
        Box::new(StaticIpSource::new(IpAddr::from(CURRENT_IP))),
        Box::new(MockProviderFactory::sharing_counters_with(&factory)),
        false,
    );
    let (sleeper, shutdown) = RecordingSleeper::stopping_after(2);

    let scheduler = Scheduler::new(engine, sleeper, INTERVAL, false);
    let started = scheduler
        .run_until(async {
            let _ = shutdown.await;
        })
        .await;

    assert_eq!(started, 2);
    assert_eq!(factory.create_count(), 2, "provider rebuilt from fresh config each cycle");
    assert_eq!(provider.list_call_count(), 2);
    assert_eq!(provider.upserts().len(), 1, "second cycle finds the record up to date");
}
