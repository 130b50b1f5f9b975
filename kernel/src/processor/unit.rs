/*!
 * Processor
 * Simulated compute unit with a finite time budget
 */

use super::reservation::Reservation;
use crate::core::errors::SchedulerError;
use crate::core::types::{SchedResult, UnitId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

static NEXT_PROCESSOR_ID: AtomicU32 = AtomicU32::new(1);

/// Processor snapshot
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    pub id: UnitId,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub capacity: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub remaining: Duration,
}

/// A processor whose capacity is the compute budget it can still hand out
///
/// `compute` reserves part of the budget until the work elapses or the
/// reservation is released, whichever happens first.
#[derive(Debug)]
pub struct Processor {
    id: UnitId,
    capacity: Duration,
    remaining: Mutex<Duration>,
}

impl Processor {
    pub fn new(capacity: Duration) -> Self {
        let id = NEXT_PROCESSOR_ID.fetch_add(1, Ordering::Relaxed);
        debug!(processor = id, capacity_ms = capacity.as_millis() as u64, "creating processor");
        Self {
            id,
            capacity,
            remaining: Mutex::new(capacity),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn capacity(&self) -> Duration {
        self.capacity
    }

    /// Remaining capacity; a higher value means a less loaded processor
    pub fn work_load(&self) -> Duration {
        *self.remaining.lock()
    }

    /// Whether `duration` could be reserved right now
    pub fn can_compute(&self, duration: Duration) -> bool {
        *self.remaining.lock() > duration
    }

    /// Reserve `duration` of capacity and run `on_complete` once it elapses
    ///
    /// The reservation is taken synchronously. Capacity is restored either
    /// when the duration elapses (just before `on_complete` runs) or when
    /// the returned [`Reservation`] is cancelled, in which case
    /// `on_complete` never runs. Must be called within a tokio runtime.
    pub fn compute<F>(self: &Arc<Self>, duration: Duration, on_complete: F) -> SchedResult<Reservation>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut remaining = self.remaining.lock();
            if *remaining <= duration {
                debug!(
                    processor = self.id,
                    requested_ms = duration.as_millis() as u64,
                    remaining_ms = remaining.as_millis() as u64,
                    "insufficient processor capacity"
                );
                return Err(SchedulerError::InsufficientCapacity {
                    requested: duration,
                    remaining: *remaining,
                });
            }
            *remaining -= duration;
        }

        debug!(processor = self.id, duration_ms = duration.as_millis() as u64, "computing process");

        let reservation = Reservation::new(Arc::clone(self), duration);
        let timer = reservation.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if timer.release() {
                on_complete();
            }
        });
        reservation.attach_timer(handle.abort_handle());

        Ok(reservation)
    }

    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            id: self.id,
            capacity: self.capacity,
            remaining: self.work_load(),
        }
    }

    pub(super) fn restore(&self, amount: Duration) {
        let mut remaining = self.remaining.lock();
        *remaining = (*remaining + amount).min(self.capacity);
        debug!(
            processor = self.id,
            restored_ms = amount.as_millis() as u64,
            remaining_ms = remaining.as_millis() as u64,
            "restored processor capacity"
        );
    }
}
