use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::StatusCode;
use tracing::{debug, error};

use crate::client::build_request;
use crate::errors::RequestError;
use crate::latch::CountdownLatch;

/// Sends one POST of `payload` to `url`.
///
/// A 200 response is drained and dropped. Anything else has its body read
/// once and returned inside [`RequestError::Status`] for the caller to report.
pub async fn perform_request(
    client: &reqwest::Client,
    url: &str,
    payload: &'static [u8],
) -> Result<(), RequestError> {
    let mut response = build_request(client, url, payload)
        .send()
        .await
        .map_err(RequestError::Transport)?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.bytes().await.map_err(RequestError::Body)?;
        return Err(RequestError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    // Consume the body so the connection goes back to the pool.
    while let Ok(Some(_chunk)) = response.chunk().await {}

    Ok(())
}

/// Number of requests currently in flight, with its high-water mark.
#[derive(Debug, Default)]
pub struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightGauge {
    /// Marks a request as started; it ends when the guard is dropped.
    pub fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        InFlightGuard { gauge: self }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

pub struct InFlightGuard<'a> {
    gauge: &'a InFlightGauge,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::AcqRel);
    }
}

/// State shared read-only (apart from atomics) by every worker of a burst.
#[derive(Debug)]
pub struct BurstShared {
    pub client: reqwest::Client,
    pub url: String,
    pub payload: &'static [u8],
    pub latch: CountdownLatch,
    pub in_flight: InFlightGauge,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl BurstShared {
    pub fn new(
        client: reqwest::Client,
        url: String,
        payload: &'static [u8],
        num_requests: usize,
    ) -> Self {
        Self {
            client,
            url,
            payload,
            latch: CountdownLatch::new(num_requests),
            in_flight: InFlightGauge::default(),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Runs request `job` to completion. Never fails: errors are logged and the
    /// job still counts as done.
    pub async fn run_job(&self, job: usize) {
        let _done = self.latch.guard();

        let result = {
            let _in_flight = self.in_flight.enter();
            perform_request(&self.client, &self.url, self.payload).await
        };

        match result {
            Ok(()) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                debug!(job, url = %self.url, "Request completed");
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                match &e {
                    RequestError::Status { status, body } => error!(
                        job,
                        url = %self.url,
                        status_code = status,
                        body = %body,
                        "Request returned non-200 status"
                    ),
                    other => error!(
                        job,
                        url = %self.url,
                        status_code = ?other.status_code(),
                        error = %other,
                        "Request failed"
                    ),
                }
            }
        }
    }

    /// Counts a job that never reached a worker as failed and done.
    pub fn abandon_job(&self, job: usize) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        error!(job, "No worker left to run request");
        self.latch.count_down();
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Acquire)
    }
}
