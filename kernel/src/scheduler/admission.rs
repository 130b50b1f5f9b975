/*!
 * Admission Loop
 * Promotes the head of NEW to READY on every tick
 */

use super::Shared;
use crate::process::{ProcessState, Transition};
use crate::task::LoopTask;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

pub(super) fn spawn(shared: Arc<Shared>) -> LoopTask {
    let period = shared.config.admission_interval;
    LoopTask::polling("admission", period, move || admit_next(&shared))
}

/// Admission does not look at resources
fn admit_next(shared: &Shared) {
    let _span = debug_span!("admission", scheduler = %shared.id).entered();

    let mut queues = shared.queues.lock();
    let Some(pcb) = queues.pop_front(ProcessState::New) else {
        return;
    };

    match pcb.admit() {
        Ok(()) => {
            queues.push(ProcessState::Ready, Arc::clone(&pcb));
            shared.stats.record(Transition::Admit);
            debug!(pid = pcb.pid(), "process admitted");
            shared.entered(&pcb, Some(ProcessState::New), ProcessState::Ready);
        }
        Err(e) => {
            // Someone moved it behind our back; file it where it really is.
            // The failure itself is reported through the notice channel.
            let actual = pcb.state();
            queues.push(actual, Arc::clone(&pcb));
            shared.locations.insert(pcb.pid(), actual);
            drop(queues);

            warn!(pid = pcb.pid(), error = %e, "admission failed");
        }
    }
}
