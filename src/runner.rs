//! Drives one burst: queue every request on the worker pool, wait for the
//! last completion, report how long it took.

use std::sync::Arc;

use tokio::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::pool::WorkerPool;
use crate::worker::BurstShared;

/// Result of a finished burst. Only `elapsed` is shown to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

impl BurstReport {
    /// Elapsed time as printed on stdout.
    pub fn elapsed_line(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Formats a duration as seconds with millisecond precision, e.g. `1.234`.
/// Whole values keep a fractional part (`0.0`, `3.0`).
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_millis() as f64 / 1000.0;
    format!("{:?}", secs)
}

/// Sends `config.num_requests` POSTs of `payload` to `config.target_url`
/// through a pool of `config.num_workers` workers and returns once every
/// request has completed, successfully or not.
pub async fn dispatch(
    client: reqwest::Client,
    config: &Config,
    payload: &'static [u8],
) -> BurstReport {
    let count = config.num_requests;
    let shared = Arc::new(BurstShared::new(
        client,
        config.target_url.clone(),
        payload,
        count,
    ));

    let pool = {
        let shared = shared.clone();
        WorkerPool::new(config.num_workers, move |job: usize| {
            let shared = shared.clone();
            async move { shared.run_job(job).await }
        })
    };

    let start = Instant::now();
    for job in 0..count {
        if let Err(job) = pool.execute(job) {
            shared.abandon_job(job);
        }
    }
    shared.latch.wait().await;
    let elapsed = start.elapsed();

    if let Err(e) = pool.shutdown().await {
        error!(error = %e, "Worker task ended abnormally");
    }

    let report = BurstReport {
        attempted: shared.succeeded() + shared.failed(),
        succeeded: shared.succeeded(),
        failed: shared.failed(),
        peak_in_flight: shared.in_flight.peak(),
        elapsed,
    };

    info!(
        attempted = report.attempted,
        failed = report.failed,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "Burst finished"
    );
    debug!(?report, "Burst report");

    report
}
