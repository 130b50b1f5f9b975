/*!
 * Compute Contract
 *
 * The work a process performs is supplied by the caller through [`Compute`].
 * A contract receives the remaining budget and exactly one [`Completion`],
 * and hands back a [`ComputeToken`] that cancels the in-flight work.
 */

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot completion callback handed to a compute contract
pub struct Completion(Callback);

impl Completion {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Signal that the work finished
    pub fn complete(self) {
        (self.0)()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}

/// Cancellation handle for in-flight work
///
/// Clones cancel the same work; cancelling twice is a no-op.
#[derive(Clone, Default)]
pub struct ComputeToken {
    cancel: Arc<Mutex<Option<Callback>>>,
}

impl ComputeToken {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Arc::new(Mutex::new(Some(Box::new(cancel)))),
        }
    }

    /// Token that aborts a spawned task
    pub fn from_abort(handle: AbortHandle) -> Self {
        Self::new(move || handle.abort())
    }

    /// Token for work that cannot be cancelled
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }
}

impl fmt::Debug for ComputeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeToken")
            .field("armed", &self.cancel.lock().is_some())
            .finish()
    }
}

/// The work behind a process
pub trait Compute: Send + Sync {
    /// Begin (or continue) the work with `budget` left, calling `done` once
    fn start(&self, budget: Duration, done: Completion) -> ComputeToken;
}

impl<F> Compute for F
where
    F: Fn(Duration, Completion) -> ComputeToken + Send + Sync,
{
    fn start(&self, budget: Duration, done: Completion) -> ComputeToken {
        self(budget, done)
    }
}

/// Work that takes exactly its remaining budget of wall time
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedWork;

impl Compute for SimulatedWork {
    fn start(&self, budget: Duration, done: Completion) -> ComputeToken {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(budget).await;
            done.complete();
        });
        ComputeToken::from_abort(handle.abort_handle())
    }
}
