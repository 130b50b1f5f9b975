/*!
 * Processor Reservation
 * Handle over a slice of processor capacity
 */

use super::unit::Processor;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Capacity taken from a [`Processor`] by `compute`
///
/// Clones share the same reservation. The capacity goes back to the
/// processor exactly once, however many times `release`/`cancel` are called.
#[derive(Debug, Clone)]
pub struct Reservation {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    processor: Arc<Processor>,
    amount: Duration,
    released: AtomicBool,
    timer: Mutex<Option<AbortHandle>>,
}

impl Reservation {
    pub(super) fn new(processor: Arc<Processor>, amount: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                processor,
                amount,
                released: AtomicBool::new(false),
                timer: Mutex::new(None),
            }),
        }
    }

    pub(super) fn attach_timer(&self, handle: AbortHandle) {
        *self.inner.timer.lock() = Some(handle);
    }

    /// Give the capacity back; returns `true` only for the call that did it
    pub fn release(&self) -> bool {
        if self.inner.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.processor.restore(self.inner.amount);
        true
    }

    /// Stop the pending completion timer and give the capacity back
    pub fn cancel(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
        self.release();
    }
}
