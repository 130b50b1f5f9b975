/*!
 * Process
 * A unit of simulated work with a resumable compute budget
 */

use super::compute::{Compute, Completion, ComputeToken, SimulatedWork};
use crate::core::errors::SchedulerError;
use crate::core::types::SchedResult;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Simulated work owned by a PCB
///
/// `computing_time` is the budget still to be spent. A cancelled run
/// subtracts the elapsed wall time, so the next `run` resumes rather than
/// restarts.
pub struct Process {
    name: String,
    file_name: String,
    needs_resource: AtomicBool,
    contract: Arc<dyn Compute>,
    run: Arc<Mutex<RunState>>,
}

#[derive(Default)]
struct RunState {
    remaining: Duration,
    started: Option<Instant>,
    token: Option<ComputeToken>,
}

impl Process {
    pub fn builder() -> ProcessBuilder {
        ProcessBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Budget left to compute
    pub fn computing_time(&self) -> Duration {
        self.run.lock().remaining
    }

    pub fn needs_resource(&self) -> bool {
        self.needs_resource.load(Ordering::SeqCst)
    }

    /// The external resource arrived; the next run computes normally
    pub fn resource_acquired(&self) {
        self.needs_resource.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().token.is_some()
    }

    /// Invoke the compute contract with the remaining budget
    ///
    /// `on_complete` runs at most once, after the budget has been zeroed.
    /// A previous run still in flight is cancelled first.
    pub fn run<F>(&self, on_complete: F) -> ComputeToken
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let budget = {
            let mut run = self.run.lock();
            run.started = Some(Instant::now());
            run.remaining
        };

        debug!(process = %self.name, budget_ms = budget.as_millis() as u64, "running process");

        let state = Arc::clone(&self.run);
        let done = Completion::new(move || {
            {
                let mut run = state.lock();
                run.remaining = Duration::ZERO;
                run.started = None;
                run.token = None;
            }
            on_complete();
        });

        let token = self.contract.start(budget, done);

        let mut run = self.run.lock();
        if run.started.is_some() {
            run.token = Some(token.clone());
        }
        token
    }

    /// Stop the in-flight run, keeping the unspent budget
    pub fn cancel(&self) {
        let token = {
            let mut run = self.run.lock();
            if let Some(started) = run.started.take() {
                let elapsed = started.elapsed();
                run.remaining = run.remaining.saturating_sub(elapsed);
                trace!(
                    process = %self.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    remaining_ms = run.remaining.as_millis() as u64,
                    "process cancelled"
                );
            }
            run.token.take()
        };

        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Stop the in-flight run and mark the budget as spent
    pub fn finish(&self) {
        let token = {
            let mut run = self.run.lock();
            run.remaining = Duration::ZERO;
            run.started = None;
            run.token.take()
        };

        if let Some(token) = token {
            token.cancel();
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("computing_time", &self.computing_time())
            .field("needs_resource", &self.needs_resource())
            .finish()
    }
}

/// Builder for [`Process`]
#[derive(Default)]
pub struct ProcessBuilder {
    name: Option<String>,
    file_name: Option<String>,
    computing_time: Duration,
    needs_resource: bool,
    contract: Option<Arc<dyn Compute>>,
}

impl ProcessBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn computing_time(mut self, computing_time: Duration) -> Self {
        self.computing_time = computing_time;
        self
    }

    #[must_use]
    pub fn needs_resource(mut self, needs_resource: bool) -> Self {
        self.needs_resource = needs_resource;
        self
    }

    #[must_use]
    pub fn compute<C>(mut self, contract: C) -> Self
    where
        C: Compute + 'static,
    {
        self.contract = Some(Arc::new(contract));
        self
    }

    /// Use [`SimulatedWork`] as the contract
    #[must_use]
    pub fn simulated(self) -> Self {
        self.compute(SimulatedWork)
    }

    pub fn build(self) -> SchedResult<Process> {
        let contract = self.contract.ok_or_else(|| {
            SchedulerError::InvalidComputeContract("no compute contract supplied".into())
        })?;

        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(SchedulerError::InvalidComputeContract(
                "process name must not be blank".into(),
            ));
        }
        let file_name = self.file_name.unwrap_or_else(|| name.clone());

        Ok(Process {
            name,
            file_name,
            needs_resource: AtomicBool::new(self.needs_resource),
            contract,
            run: Arc::new(Mutex::new(RunState {
                remaining: self.computing_time,
                ..RunState::default()
            })),
        })
    }
}
