/*!
 * Process Control Block
 *
 * The scheduling record of one process and the state machine that drives it.
 *
 * # Run Slot
 *
 * Entering RUNNING arms up to three competing sources: the quantum timer,
 * the process's own completion (plus the processor's compute timer), or the
 * external-wait timer for a blocked process. Every source captures the
 * epoch current when it was armed. Firing locks the PCB, compares epochs and
 * bumps the epoch on success, so the first source to fire claims the period
 * and every sibling that fires later finds a stale epoch and does nothing.
 * The sibling handles are taken under the lock and aborted outside it.
 */

use super::compute::ComputeToken;
use super::state::{ProcessState, Transition};
use super::types::{PcbMeta, PcbNotice, PcbSnapshot, StateChange};
use super::work::Process;
use crate::core::config::{ByteRange, DelayRange};
use crate::core::errors::SchedulerError;
use crate::core::types::{Pid, Priority, SchedResult, Size};
use crate::memory::Memory;
use crate::processor::Processor;
use crate::resources::Lease;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// Handles armed for one RUNNING (or WAITING) period
#[derive(Default)]
struct Timers {
    quantum: Option<AbortHandle>,
    wait: Option<AbortHandle>,
    compute: Option<ComputeToken>,
}

impl Timers {
    fn cancel(self) {
        if let Some(quantum) = self.quantum {
            quantum.abort();
        }
        if let Some(wait) = self.wait {
            wait.abort();
        }
        if let Some(compute) = self.compute {
            compute.cancel();
        }
    }
}

struct Inner {
    state: ProcessState,
    lease: Option<Lease>,
    epoch: u64,
    timers: Timers,
    pointer_control: u64,
}

/// Process control block
///
/// Handles are shared as `Arc<ProcessControlBlock>`. The processor and memory
/// assignment is present exactly while the state is RUNNING.
pub struct ProcessControlBlock {
    pid: Pid,
    quantum: Duration,
    priority: Priority,
    memory_consumption: Size,
    process: Process,
    wait_delay: DelayRange,
    inner: Mutex<Inner>,
    reporter: Mutex<Option<mpsc::UnboundedSender<PcbNotice>>>,
    self_ref: Weak<Self>,
}

impl ProcessControlBlock {
    /// Create a PCB in NEW
    ///
    /// A missing `memory_consumption` is drawn from the default byte range.
    /// `wait_delay` is the simulated external event a blocked process waits on.
    pub fn new(meta: PcbMeta, process: Process, wait_delay: DelayRange) -> Arc<Self> {
        let memory_consumption = meta
            .memory_consumption
            .unwrap_or_else(|| ByteRange::default().sample());

        debug!(
            pid = meta.pid,
            process = %process.name(),
            quantum_ms = meta.quantum.as_millis() as u64,
            priority = meta.priority,
            bytes = memory_consumption,
            "creating pcb"
        );

        Arc::new_cyclic(|self_ref| Self {
            pid: meta.pid,
            quantum: meta.quantum,
            priority: meta.priority,
            memory_consumption,
            process,
            wait_delay,
            inner: Mutex::new(Inner {
                state: ProcessState::New,
                lease: None,
                epoch: 0,
                timers: Timers::default(),
                pointer_control: 0,
            }),
            reporter: Mutex::new(None),
            self_ref: self_ref.clone(),
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Informational; dispatch order is FIFO
    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn memory_consumption(&self) -> Size {
        self.memory_consumption
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn state(&self) -> ProcessState {
        self.inner.lock().state
    }

    pub fn assigned_processor(&self) -> Option<Arc<Processor>> {
        self.inner
            .lock()
            .lease
            .as_ref()
            .map(|lease| Arc::clone(lease.processor()))
    }

    pub fn assigned_memory(&self) -> Option<Arc<Memory>> {
        self.inner
            .lock()
            .lease
            .as_ref()
            .map(|lease| Arc::clone(lease.memory()))
    }

    /// Number of times this PCB has been dispatched
    pub fn dispatches(&self) -> u64 {
        self.inner.lock().pointer_control
    }

    /// Route state changes and errors to `reporter`, replacing any previous one
    pub fn subscribe(&self, reporter: mpsc::UnboundedSender<PcbNotice>) {
        *self.reporter.lock() = Some(reporter);
    }

    pub fn snapshot(&self) -> PcbSnapshot {
        let inner = self.inner.lock();
        PcbSnapshot {
            pid: self.pid,
            name: self.process.name().to_string(),
            file_name: self.process.file_name().to_string(),
            state: inner.state,
            priority: self.priority,
            quantum: self.quantum,
            computing_time: self.process.computing_time(),
            memory_consumption: self.memory_consumption,
            needs_resource: self.process.needs_resource(),
            processor: inner.lease.as_ref().map(|lease| lease.processor().id()),
            memory: inner.lease.as_ref().map(|lease| lease.memory().id()),
            dispatches: inner.pointer_control,
        }
    }

    /// NEW → READY
    pub fn admit(&self) -> SchedResult<()> {
        self.fire(Transition::Admit, None, None).map(|_| ())
    }

    /// READY → RUNNING, holding `lease` until RUNNING ends
    ///
    /// Arms the competing sources of the new RUNNING period. A process that
    /// needs an external resource moves straight on to WAITING.
    pub fn start(&self, lease: Lease) -> SchedResult<()> {
        if let Some(epoch) = self.fire(Transition::Start, None, Some(lease))? {
            self.arm(epoch)?;
        }
        Ok(())
    }

    /// Lease `processor` and `memory` for the remaining work, then START
    ///
    /// Fails without side effects when either resource cannot hold the
    /// process. The processor's reservation elapsing counts as completion.
    pub fn dispatch(&self, processor: &Arc<Processor>, memory: &Arc<Memory>) -> SchedResult<()> {
        let pcb = self.self_ref.clone();
        let period = self.dispatches() + 1;
        let lease = Lease::acquire(
            processor,
            memory,
            self.memory_consumption,
            self.process.computing_time(),
            move || {
                if let Some(pcb) = pcb.upgrade() {
                    pcb.compute_elapsed(period);
                }
            },
        )?;
        self.start(lease)
    }

    /// RUNNING → READY
    pub fn interrupt(&self) -> SchedResult<()> {
        self.fire(Transition::Interrupt, None, None).map(|_| ())
    }

    /// RUNNING → WAITING
    ///
    /// Unlike the wait taken on dispatch, no external-event timer is armed;
    /// the caller is expected to `resume`.
    pub fn wait(&self) -> SchedResult<()> {
        self.fire(Transition::Wait, None, None).map(|_| ())
    }

    /// WAITING → READY
    pub fn resume(&self) -> SchedResult<()> {
        self.fire(Transition::Resume, None, None).map(|_| ())
    }

    /// RUNNING → TERMINATED
    pub fn terminate(&self) -> SchedResult<()> {
        self.fire(Transition::Terminate, None, None).map(|_| ())
    }

    /// The processor's reservation for dispatch number `period` elapsed
    fn compute_elapsed(&self, period: u64) {
        let epoch = {
            let inner = self.inner.lock();
            if inner.state != ProcessState::Running || inner.pointer_control != period {
                trace!(pid = self.pid, period, "processor time of an earlier dispatch ignored");
                return;
            }
            inner.epoch
        };
        let _ = self.fire(Transition::Terminate, Some(epoch), None);
    }

    /// Apply `transition`
    ///
    /// With `slot` set, the call comes from an armed source and is dropped
    /// silently (`Ok(None)`) if its period already ended. Returns the epoch
    /// of the period that begins.
    fn fire(
        &self,
        transition: Transition,
        slot: Option<u64>,
        lease: Option<Lease>,
    ) -> SchedResult<Option<u64>> {
        let (from, epoch, timers, released) = {
            let mut inner = self.inner.lock();

            if slot.is_some_and(|epoch| epoch != inner.epoch) {
                trace!(pid = self.pid, %transition, "stale timer ignored");
                return Ok(None);
            }

            let from = inner.state;
            if from != transition.origin() {
                drop(inner);
                let err = SchedulerError::IllegalTransition {
                    pid: self.pid,
                    transition,
                    expected: transition.origin(),
                    actual: from,
                };
                debug!(pid = self.pid, error = %err, "illegal transition refused");
                self.report(PcbNotice::Failed(err.clone()));
                return Err(err);
            }

            inner.state = transition.target();
            inner.epoch += 1;

            let released = if from == ProcessState::Running {
                inner.lease.take()
            } else {
                None
            };

            match transition {
                Transition::Start => {
                    inner.lease = lease;
                    inner.pointer_control += 1;
                }
                Transition::Resume => self.process.resource_acquired(),
                _ => {}
            }

            (from, inner.epoch, std::mem::take(&mut inner.timers), released)
        };

        timers.cancel();
        match transition {
            Transition::Interrupt | Transition::Wait => self.process.cancel(),
            Transition::Terminate => self.process.finish(),
            _ => {}
        }
        if let Some(lease) = released {
            lease.release();
        }

        debug!(
            pid = self.pid,
            %transition,
            from = %from,
            to = %transition.target(),
            remaining_ms = self.process.computing_time().as_millis() as u64,
            "state changed"
        );

        if let Some(pcb) = self.self_ref.upgrade() {
            self.report(PcbNotice::Changed(StateChange {
                pcb,
                transition,
                from,
                to: transition.target(),
            }));
        }

        Ok(Some(epoch))
    }

    fn arm(&self, epoch: u64) -> SchedResult<()> {
        if self.process.needs_resource() {
            let Some(epoch) = self.fire(Transition::Wait, Some(epoch), None)? else {
                return Ok(());
            };

            let delay = self.wait_delay.sample();
            trace!(pid = self.pid, delay_ms = delay.as_millis() as u64, "waiting on external event");
            let pcb = self.self_ref.clone();
            let wait = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(pcb) = pcb.upgrade() {
                    let _ = pcb.fire(Transition::Resume, Some(epoch), None);
                }
            });

            self.register(
                epoch,
                Timers {
                    wait: Some(wait.abort_handle()),
                    ..Timers::default()
                },
            );
            return Ok(());
        }

        let quantum = (!self.quantum.is_zero()).then(|| {
            let period = self.quantum;
            let pcb = self.self_ref.clone();
            tokio::spawn(async move {
                tokio::time::sleep(period).await;
                if let Some(pcb) = pcb.upgrade() {
                    let _ = pcb.fire(Transition::Interrupt, Some(epoch), None);
                }
            })
            .abort_handle()
        });

        let pcb = self.self_ref.clone();
        let compute = self.process.run(move || {
            if let Some(pcb) = pcb.upgrade() {
                let _ = pcb.fire(Transition::Terminate, Some(epoch), None);
            }
        });

        self.register(
            epoch,
            Timers {
                quantum,
                compute: Some(compute),
                wait: None,
            },
        );
        Ok(())
    }

    fn register(&self, epoch: u64, timers: Timers) {
        let mut inner = self.inner.lock();
        if inner.epoch == epoch {
            inner.timers = timers;
        } else {
            // Period already claimed while arming
            drop(inner);
            timers.cancel();
        }
    }

    fn report(&self, notice: PcbNotice) {
        if let Some(reporter) = self.reporter.lock().as_ref() {
            let _ = reporter.send(notice);
        }
    }
}

impl fmt::Debug for ProcessControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessControlBlock")
            .field("pid", &self.pid)
            .field("state", &self.state())
            .field("quantum", &self.quantum)
            .field("priority", &self.priority)
            .field("memory_consumption", &self.memory_consumption)
            .field("process", &self.process)
            .finish()
    }
}

impl Drop for ProcessControlBlock {
    fn drop(&mut self) {
        std::mem::take(&mut self.inner.get_mut().timers).cancel();
    }
}
