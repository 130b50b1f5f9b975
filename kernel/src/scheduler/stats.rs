/*!
 * Scheduler Statistics
 * Atomic counters updated from the scheduler loops
 */

use super::queues::QueueLengths;
use crate::process::Transition;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Point-in-time view of a scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub id: Uuid,
    pub queues: QueueLengths,
    pub scheduled: u64,
    pub admitted: u64,
    pub dispatched: u64,
    pub interrupted: u64,
    pub waited: u64,
    pub resumed: u64,
    pub terminated: u64,
    /// Dispatch attempts retried for lack of resources
    pub deferred: u64,
    pub errors: u64,
}

/// Lock-free counters behind [`SchedulerStats`]
///
/// Relaxed ordering: each counter is exact, but a snapshot may mix
/// values from slightly different instants.
#[derive(Debug, Default)]
pub(crate) struct AtomicSchedulerStats {
    scheduled: AtomicU64,
    transitions: [AtomicU64; 6],
    deferred: AtomicU64,
    errors: AtomicU64,
}

impl AtomicSchedulerStats {
    #[inline]
    pub fn inc_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record(&self, transition: Transition) {
        self.transitions[slot(transition)].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, id: Uuid, queues: QueueLengths) -> SchedulerStats {
        let count = |t| self.transitions[slot(t)].load(Ordering::Relaxed);
        SchedulerStats {
            id,
            queues,
            scheduled: self.scheduled.load(Ordering::Relaxed),
            admitted: count(Transition::Admit),
            dispatched: count(Transition::Start),
            interrupted: count(Transition::Interrupt),
            waited: count(Transition::Wait),
            resumed: count(Transition::Resume),
            terminated: count(Transition::Terminate),
            deferred: self.deferred.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

fn slot(transition: Transition) -> usize {
    match transition {
        Transition::Admit => 0,
        Transition::Start => 1,
        Transition::Interrupt => 2,
        Transition::Wait => 3,
        Transition::Resume => 4,
        Transition::Terminate => 5,
    }
}
