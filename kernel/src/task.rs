/*!
 * Background Loop Tasks
 *
 * Every long-lived loop in the crate (resource monitor, admission, dispatch,
 * queue migration) runs as a tokio task behind a [`LoopTask`] handle.
 *
 * # Graceful-with-Fallback Shutdown
 *
 * Drop can't be async, so the handle offers two paths:
 *
 * 1. **Preferred:** `shutdown().await` sends `Shutdown` and awaits the task.
 * 2. **Fallback:** `Drop` aborts the task if it is still running and
 *    `shutdown()` was never called, logging a warning.
 */

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Control messages for a loop task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    /// Leave the loop
    Shutdown,
}

/// Handle to a background loop
pub struct LoopTask {
    name: &'static str,
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    handle: Option<JoinHandle<()>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl LoopTask {
    /// Spawn `body`, handing it the receiving end of the command channel
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(mpsc::UnboundedReceiver<LoopCommand>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(body(command_rx));

        debug!(task = name, "loop task spawned");

        Self {
            name,
            command_tx,
            handle: Some(handle),
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn a loop calling `tick` every `period`, starting immediately
    pub fn polling<T>(name: &'static str, period: Duration, tick: T) -> Self
    where
        T: FnMut() + Send + 'static,
    {
        Self::spawn(name, move |commands| run_polling_loop(name, period, tick, commands))
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        self.shutdown_initiated.store(true, Ordering::SeqCst);
        let _ = self.command_tx.send(LoopCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(task = self.name, error = %e, "loop task shutdown error");
            } else {
                info!(task = self.name, "loop task shutdown complete");
            }
        }
    }
}

async fn run_polling_loop<T>(
    name: &'static str,
    period: Duration,
    mut tick: T,
    mut commands: mpsc::UnboundedReceiver<LoopCommand>,
) where
    T: FnMut(),
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(task = name, period_ms = period.as_millis() as u64, "loop started");

    loop {
        tokio::select! {
            _ = interval.tick() => tick(),

            cmd = commands.recv() => {
                if matches!(cmd, Some(LoopCommand::Shutdown) | None) {
                    info!(task = name, "loop shutting down");
                    break;
                }
            }
        }
    }
}

impl Drop for LoopTask {
    fn drop(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                return;
            }
            warn!(
                task = self.name,
                "loop task dropped without calling shutdown() - aborting task"
            );
            handle.abort();
        }
    }
}
