use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;
use worm_core::error::Result;

/// Runs a handler, then sleeps for whatever is left of the interval.
///
/// A cycle that overruns the interval is followed immediately by the next
/// one, so the effective period is `max(interval, handler duration)`. Cycles
/// are never skipped and never overlap.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    fail_on_error: bool,
    max_cycles: Option<u64>,
}

impl Scheduler {
    pub fn new(interval: Duration, fail_on_error: bool) -> Self {
        Self {
            interval,
            fail_on_error,
            max_cycles: None,
        }
    }

    /// Stop after `cycles` cycles instead of running forever.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Returns only when the cycle limit is reached, or with the handler's
    /// error when `fail_on_error` is set.
    pub async fn run<F, Fut, T>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Debug,
    {
        let mut completed: u64 = 0;
        loop {
            let start = Instant::now();
            let cycle_id = Uuid::new_v4();
            info!(%cycle_id, "executing handler function");

            match handler().instrument(info_span!("cycle", %cycle_id)).await {
                Ok(outcome) => debug!(%cycle_id, ?outcome, "handler completed"),
                Err(e) => {
                    error!(%cycle_id, error = %e, "unable to execute handler");
                    if self.fail_on_error {
                        return Err(e);
                    }
                }
            }

            completed += 1;
            if self.max_cycles.is_some_and(|max| completed >= max) {
                return Ok(());
            }

            let elapsed = start.elapsed();
            match sleep_time(elapsed, self.interval) {
                Some(remaining) => {
                    info!(seconds = remaining.as_secs_f64(), "sleeping until next cycle");
                    tokio::time::sleep(remaining).await;
                }
                None => warn!(
                    elapsed_secs = elapsed.as_secs_f64(),
                    interval_secs = self.interval.as_secs_f64(),
                    "handler execution exceeded interval; executing again"
                ),
            }
        }
    }
}

/// Remaining time in the interval, or `None` when the cycle overran it.
pub fn sleep_time(elapsed: Duration, interval: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|d| !d.is_zero())
}
