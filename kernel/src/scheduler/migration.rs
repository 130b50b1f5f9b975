/*!
 * Queue Migration
 * Moves dispatched PCBs to the queue of the state they report
 */

use super::{SchedulerEvent, Shared};
use crate::process::{PcbNotice, StateChange};
use crate::task::{LoopCommand, LoopTask};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(super) fn spawn(shared: Arc<Shared>, notices: mpsc::UnboundedReceiver<PcbNotice>) -> LoopTask {
    LoopTask::spawn("migration", move |commands| migrate_loop(shared, notices, commands))
}

async fn migrate_loop(
    shared: Arc<Shared>,
    mut notices: mpsc::UnboundedReceiver<PcbNotice>,
    mut commands: mpsc::UnboundedReceiver<LoopCommand>,
) {
    info!(scheduler = %shared.id, "migration worker started");

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(PcbNotice::Changed(change)) => apply(&shared, change),
                Some(PcbNotice::Failed(e)) => {
                    shared.stats.inc_errors();
                    shared.emit(SchedulerEvent::Error(e));
                }
                None => break,
            },

            cmd = commands.recv() => {
                if matches!(cmd, Some(LoopCommand::Shutdown) | None) {
                    break;
                }
            }
        }
    }

    info!(scheduler = %shared.id, "migration worker stopped");
}

fn apply(shared: &Shared, change: StateChange) {
    // ADMIT and START are filed by the loops that perform them
    if !change.transition.is_reported() {
        return;
    }

    let pid = change.pcb.pid();
    let mut queues = shared.queues.lock();
    if !queues.migrate(pid, change.from, change.to) {
        warn!(pid, from = %change.from, to = %change.to, "pcb is in no queue, not migrated");
        return;
    }

    shared.stats.record(change.transition);
    debug!(pid, transition = %change.transition, to = %change.to, "pcb migrated");
    shared.entered(&change.pcb, Some(change.from), change.to);
}
