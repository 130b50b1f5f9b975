/*!
 * Scheduler
 *
 * Owns the five state queues and the loops that move PCBs between them:
 *
 * - admission: promotes the head of NEW to READY every admission interval
 * - dispatch: one loop per `run(processor, memory)`, starting the head of
 *   READY whenever the pair can hold it
 * - migration: follows the notices of dispatched PCBs and moves them to
 *   the queue of the state they entered
 */

mod admission;
mod dispatch;
mod events;
mod migration;
mod queues;
mod stats;

pub use events::{SchedulerEvent, DEFERRED_TOPIC, ERROR_TOPIC, TRANSITION_TOPIC};
pub use queues::{QueueLengths, Queues};
pub use stats::SchedulerStats;

use crate::core::config::SchedulerConfig;
use crate::core::types::{Pid, SchedResult};
use crate::memory::Memory;
use crate::process::{PcbMeta, PcbNotice, Process, ProcessControlBlock, ProcessState};
use crate::processor::Processor;
use crate::task::LoopTask;
use dashmap::DashMap;
use parking_lot::Mutex;
use stats::AtomicSchedulerStats;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};
use uuid::Uuid;

/// State shared between the scheduler handle and its loops
pub(crate) struct Shared {
    id: Uuid,
    config: SchedulerConfig,
    queues: Mutex<Queues>,
    locations: DashMap<Pid, ProcessState>,
    events: broadcast::Sender<SchedulerEvent>,
    notices: mpsc::UnboundedSender<PcbNotice>,
    stats: AtomicSchedulerStats,
}

impl Shared {
    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    /// Record that `pcb` now sits in the `to` queue and notify observers
    fn entered(
        &self,
        pcb: &Arc<ProcessControlBlock>,
        from: Option<ProcessState>,
        to: ProcessState,
    ) {
        self.locations.insert(pcb.pid(), to);
        self.emit(SchedulerEvent::Entered {
            pcb: Arc::clone(pcb),
            from,
            to,
        });
        self.emit(SchedulerEvent::Transition {
            pcb: Arc::clone(pcb),
            to,
        });
    }
}

/// Preemptive, resource-constrained process scheduler
///
/// Must be created within a tokio runtime; the admission loop and the
/// migration worker start immediately.
pub struct Scheduler {
    shared: Arc<Shared>,
    admission: Mutex<Option<LoopTask>>,
    migration: Mutex<Option<LoopTask>>,
    dispatchers: Mutex<Vec<LoopTask>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> SchedResult<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        let (events, _) = broadcast::channel(config.event_capacity);
        let (notices, notice_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            id,
            config,
            queues: Mutex::new(Queues::new()),
            locations: DashMap::new(),
            events,
            notices,
            stats: AtomicSchedulerStats::default(),
        });

        let admission = admission::spawn(Arc::clone(&shared));
        let migration = migration::spawn(Arc::clone(&shared), notice_rx);

        info!(
            scheduler = %id,
            admission_ms = shared.config.admission_interval.as_millis() as u64,
            dispatch_ms = shared.config.dispatch_interval.as_millis() as u64,
            "scheduler started"
        );

        Ok(Self {
            shared,
            admission: Mutex::new(Some(admission)),
            migration: Mutex::new(Some(migration)),
            dispatchers: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.shared.events.subscribe()
    }

    /// Subscribe as a stream; lagged receivers yield an error item
    pub fn events(&self) -> BroadcastStream<SchedulerEvent> {
        BroadcastStream::new(self.subscribe())
    }

    /// Create a PCB for `process` and queue it in NEW
    ///
    /// A missing memory consumption in `meta` is drawn from the configured
    /// range.
    pub fn schedule(&self, meta: PcbMeta, process: Process) -> Arc<ProcessControlBlock> {
        let shared = &self.shared;
        let meta = PcbMeta {
            memory_consumption: Some(
                meta.memory_consumption
                    .unwrap_or_else(|| shared.config.memory_consumption.sample()),
            ),
            ..meta
        };

        let pcb = ProcessControlBlock::new(meta, process, shared.config.external_wait);
        pcb.subscribe(shared.notices.clone());
        shared.queues.lock().push(ProcessState::New, Arc::clone(&pcb));
        shared.stats.inc_scheduled();

        debug!(
            scheduler = %shared.id,
            pid = pcb.pid(),
            bytes = pcb.memory_consumption(),
            "process scheduled"
        );
        shared.entered(&pcb, None, ProcessState::New);
        pcb
    }

    /// Start a dispatch loop feeding `processor` and `memory` from READY
    ///
    /// May be called repeatedly; each call adds an independent loop.
    pub fn run(&self, processor: Arc<Processor>, memory: Arc<Memory>) {
        let task = dispatch::spawn(Arc::clone(&self.shared), processor, memory);
        self.dispatchers.lock().push(task);
    }

    /// The queue `pid` currently sits in
    pub fn locate(&self, pid: Pid) -> Option<ProcessState> {
        self.shared.locations.get(&pid).map(|entry| *entry.value())
    }

    /// Snapshot of the `state` queue, head first
    pub fn queue(&self, state: ProcessState) -> Vec<Arc<ProcessControlBlock>> {
        self.shared.queues.lock().snapshot(state)
    }

    pub fn stats(&self) -> SchedulerStats {
        let lengths = self.shared.queues.lock().lengths();
        self.shared.stats.snapshot(self.shared.id, lengths)
    }

    /// Stop every loop and wait for them to exit
    pub async fn shutdown(&self) {
        let admission = self.admission.lock().take();
        let dispatchers = std::mem::take(&mut *self.dispatchers.lock());
        let migration = self.migration.lock().take();

        if let Some(admission) = admission {
            admission.shutdown().await;
        }
        for dispatcher in dispatchers {
            dispatcher.shutdown().await;
        }
        if let Some(migration) = migration {
            migration.shutdown().await;
        }

        info!(scheduler = %self.shared.id, "scheduler stopped");
    }
}
