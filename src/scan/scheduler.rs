//! Fixed-interval driver for the scan cycle
//!
//! One long-lived task runs cycles strictly one after another. Ticks are not
//! queued: when a cycle overruns its interval the next one starts right
//! away and the schedule continues from there. The loop only ends when the
//! shutdown future resolves, and never in the middle of a cycle.

use crate::scan::cycle::{CycleStage, ScanCycle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub struct Watcher {
    cycle: Arc<ScanCycle>,
    interval: Duration,
}

impl Watcher {
    pub fn new(cycle: ScanCycle, interval: Duration) -> Self {
        Self {
            cycle: Arc::new(cycle),
            interval,
        }
    }

    /// Run cycles until `shutdown` resolves; returns how many cycles ran
    pub async fn run_until<F>(self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!("Watching the gist feed every {:?}", self.interval);
        let mut cycles = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            cycles += 1;
            self.tick(cycles).await;
            tracing::trace!(stage = %CycleStage::Idle, "Waiting for the next tick");
        }

        tracing::info!("Watcher stopped after {} cycles", cycles);
        cycles
    }

    async fn tick(&self, number: u64) {
        let cycle = Arc::clone(&self.cycle);
        // A panicking cycle must not take the loop down with it
        let outcome = tokio::spawn(async move { cycle.run_once().await }).await;

        match outcome {
            Ok(Ok(stats)) => {
                tracing::debug!(cycle = number, "Cycle finished in {}ms", stats.duration_ms);
            }
            Ok(Err(e)) if e.is_contract_violation() => {
                tracing::error!(
                    fatal = true,
                    cycle = number,
                    stage = %CycleStage::ErrorRecovery,
                    "{}; stored state needs attention, checkpoint not advanced",
                    e
                );
            }
            Ok(Err(e)) => {
                tracing::error!(
                    cycle = number,
                    stage = %CycleStage::ErrorRecovery,
                    "{}; retrying on the next tick",
                    e
                );
            }
            Err(e) => {
                tracing::error!(fatal = true, cycle = number, "Scan cycle task failed: {}", e);
            }
        }
    }
}
