//! Fixed-interval scheduler
//!
//! Runs a [`Cycle`] forever with a fixed sleep between the end of one cycle
//! and the start of the next. There is no backoff, jitter or drift
//! correction: the period is cycle duration plus interval.
//!
//! Each cycle runs in its own task. A panic inside a cycle surfaces as a
//! `JoinError`, is logged, and the scheduler carries on.

use super::{CycleOutcome, DdnsEngine};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// One unit of scheduled work
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    /// Run the work once
    async fn run_cycle(&self) -> CycleOutcome;
}

#[async_trait]
impl Cycle for DdnsEngine {
    async fn run_cycle(&self) -> CycleOutcome {
        DdnsEngine::run_cycle(self).await
    }
}

/// Source of inter-cycle delays
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs a cycle at a fixed interval
pub struct Scheduler<C, S> {
    cycle: Arc<C>,
    sleeper: S,
    interval: Duration,
    dry_run: bool,
}

impl<C: Cycle, S: Sleeper> Scheduler<C, S> {
    /// Create a scheduler
    ///
    /// With `dry_run` set, [`Scheduler::run`] returns after the first cycle.
    pub fn new(cycle: C, sleeper: S, interval: Duration, dry_run: bool) -> Self {
        Self::with_shared(Arc::new(cycle), sleeper, interval, dry_run)
    }

    /// Create a scheduler around a cycle the caller keeps a handle to
    pub fn with_shared(cycle: Arc<C>, sleeper: S, interval: Duration, dry_run: bool) -> Self {
        Self {
            cycle,
            sleeper,
            interval,
            dry_run,
        }
    }

    /// The interval between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until dry-run completion; otherwise forever
    pub async fn run(&self) -> usize {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until dry-run completion or until `shutdown` resolves
    ///
    /// Shutdown is only observed between cycles; an in-flight cycle always
    /// finishes. Returns the number of cycles started.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Starting DDNS service. Interval: {} minutes ({}s).",
            self.interval.as_secs_f64() / 60.0,
            self.interval.as_secs()
        );

        let mut cycles = 0;
        loop {
            cycles += 1;
            self.run_contained().await;

            if self.dry_run {
                info!("Dry run completed. Exiting.");
                break;
            }

            info!(
                "Waiting {} minutes for next update...",
                self.interval.as_secs_f64() / 60.0
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, scheduler stopping");
                    break;
                }
                _ = self.sleeper.sleep(self.interval) => {}
            }
        }

        cycles
    }

    /// Run one cycle, logging anything that escapes it
    async fn run_contained(&self) -> Option<CycleOutcome> {
        let cycle = Arc::clone(&self.cycle);
        match tokio::spawn(async move { cycle.run_cycle().await }).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Unexpected error in update loop: {}", e);
                None
            }
        }
    }
}
