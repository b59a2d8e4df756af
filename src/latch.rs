//! A one-shot countdown latch for async code.
//!
//! Workers call [`CountdownLatch::count_down`] once per finished request; the
//! driver awaits [`CountdownLatch::wait`], which resolves once the count hits
//! zero. A latch created with zero is already open.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Debug)]
pub struct CountdownLatch {
    remaining: AtomicUsize,
    notify: Notify,
}

impl CountdownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        }
    }

    /// Records one completion. Extra calls after reaching zero are ignored.
    pub fn count_down(&self) {
        let prev = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        if prev == Ok(1) {
            self.notify.notify_waiters();
        }
    }

    /// Completions still outstanding.
    pub fn count(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Returns a guard that counts down when dropped, including on unwind.
    pub fn guard(&self) -> CountdownGuard<'_> {
        CountdownGuard { latch: self }
    }

    /// Waits until the count reaches zero.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a count_down between the check and
            // the await cannot be missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Counts its latch down once when dropped.
#[must_use = "the latch is counted down when the guard is dropped"]
pub struct CountdownGuard<'a> {
    latch: &'a CountdownLatch,
}

impl Drop for CountdownGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
