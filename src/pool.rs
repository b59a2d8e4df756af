//! Fixed-size worker pool fed by a job queue.
//!
//! `size` worker tasks pull jobs from one shared channel and run them one at a
//! time, so at most `size` jobs execute concurrently. A job that panics is
//! logged and its worker moves on to the next job. [`WorkerPool::shutdown`]
//! closes the queue, lets workers drain what is left, and joins them.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error};

pub struct WorkerPool<J> {
    sender: mpsc::UnboundedSender<J>,
    handles: Vec<JoinHandle<()>>,
}

impl<J: Send + 'static> WorkerPool<J> {
    /// Spawns `size` workers that call `handler` for every job.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn new<F, Fut>(size: usize, handler: F) -> Self
    where
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        assert!(size > 0, "worker pool needs at least one worker");

        let (sender, receiver) = mpsc::unbounded_channel::<J>();
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);

        let handles = (0..size)
            .map(|worker_id| {
                let receiver = receiver.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    loop {
                        // Lock is released before the job runs.
                        let job = receiver.lock().await.recv().await;
                        let Some(job) = job else { break };

                        // A panicking job must not take its worker, and the
                        // jobs still queued behind it, down with it.
                        if let Err(e) = tokio::spawn(handler(job)).await {
                            error!(worker_id, error = %e, "Job ended abnormally");
                        }
                    }
                    debug!(worker_id, "Worker stopping, queue closed");
                })
            })
            .collect();

        Self { sender, handles }
    }

    /// Queues a job. Gives the job back if every worker has died.
    pub fn execute(&self, job: J) -> Result<(), J> {
        self.sender.send(job).map_err(|e| e.0)
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Stops accepting jobs and waits for every worker to finish.
    ///
    /// Returns the first worker failure, after all workers have been joined.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        drop(self.sender);

        let mut first_err = None;
        for handle in self.handles {
            if let Err(e) = handle.await {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
