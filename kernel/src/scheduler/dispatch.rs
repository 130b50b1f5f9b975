/*!
 * Dispatch Loop
 * Starts the head of READY on a fixed processor and memory pair
 */

use super::{SchedulerEvent, Shared};
use crate::memory::Memory;
use crate::process::{ProcessState, Transition};
use crate::processor::Processor;
use crate::task::LoopTask;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

pub(super) fn spawn(shared: Arc<Shared>, processor: Arc<Processor>, memory: Arc<Memory>) -> LoopTask {
    let period = shared.config.dispatch_interval;
    debug!(
        scheduler = %shared.id,
        processor = processor.id(),
        memory = memory.id(),
        "starting dispatch loop"
    );
    LoopTask::polling("dispatch", period, move || {
        dispatch_next(&shared, &processor, &memory)
    })
}

/// One tick: start the head of READY or leave it there for the next tick
fn dispatch_next(shared: &Shared, processor: &Arc<Processor>, memory: &Arc<Memory>) {
    let _span = debug_span!(
        "dispatch",
        scheduler = %shared.id,
        processor = processor.id(),
        memory = memory.id()
    )
    .entered();

    // Held across START and its notification so the migration worker
    // handles whatever the PCB reports next only after it sits in RUNNING
    let mut queues = shared.queues.lock();
    let Some(pcb) = queues.front(ProcessState::Ready).cloned() else {
        return;
    };

    match pcb.dispatch(processor, memory) {
        Ok(()) => {
            queues.pop_front(ProcessState::Ready);
            queues.push(ProcessState::Running, Arc::clone(&pcb));
            shared.stats.record(Transition::Start);
            debug!(pid = pcb.pid(), bytes = pcb.memory_consumption(), "process dispatched");
            shared.entered(&pcb, Some(ProcessState::Ready), ProcessState::Running);
        }
        Err(e) if e.is_resource_exhaustion() => {
            drop(queues);
            warn!(
                pid = pcb.pid(),
                bytes = pcb.memory_consumption(),
                budget_ms = pcb.process().computing_time().as_millis() as u64,
                available = memory.available_memory(),
                error = %e,
                "not enough resources to dispatch, retrying next tick"
            );
            shared.stats.inc_deferred();
            shared.emit(SchedulerEvent::Deferred { pcb, error: e });
        }
        Err(e) => {
            // Already reported through the notice channel
            queues.pop_front(ProcessState::Ready);
            let actual = pcb.state();
            queues.push(actual, Arc::clone(&pcb));
            shared.locations.insert(pcb.pid(), actual);
            drop(queues);

            warn!(pid = pcb.pid(), error = %e, "dispatch failed");
        }
    }
}
