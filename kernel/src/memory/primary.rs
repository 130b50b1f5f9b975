/*!
 * Primary Memory
 * Capacity-bounded byte allocator with graceful exhaustion handling
 */

use super::types::{MemoryPressure, MemoryStats};
use crate::core::errors::SchedulerError;
use crate::core::types::{SchedResult, Size, UnitId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

static NEXT_MEMORY_ID: AtomicU32 = AtomicU32::new(1);

/// A primary memory slot
///
/// Only the consumed byte count is tracked; there are no addresses.
/// `0 <= consumed <= capacity` holds after every operation.
#[derive(Debug)]
pub struct Memory {
    id: UnitId,
    capacity: Size,
    consumed: Mutex<Size>,
}

impl Memory {
    pub fn new(capacity: Size) -> Self {
        let id = NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed);
        debug!(memory = id, capacity, "creating memory");
        Self {
            id,
            capacity,
            consumed: Mutex::new(0),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn capacity(&self) -> Size {
        self.capacity
    }

    pub fn consumed_memory(&self) -> Size {
        *self.consumed.lock()
    }

    pub fn available_memory(&self) -> Size {
        self.capacity - *self.consumed.lock()
    }

    /// Allocate `bytes`, or fail leaving the slot untouched
    pub fn allocate(&self, bytes: Size) -> SchedResult<()> {
        let mut consumed = self.consumed.lock();

        if consumed
            .checked_add(bytes)
            .map_or(true, |total| total > self.capacity)
        {
            let available = self.capacity - *consumed;
            debug!(
                memory = self.id,
                requested = bytes,
                available,
                "memory exhausted, allocation refused"
            );
            return Err(SchedulerError::ResourceExceeded {
                requested: bytes,
                available,
                consumed: *consumed,
                capacity: self.capacity,
            });
        }

        *consumed += bytes;
        let used = *consumed;
        drop(consumed);

        if self.pressure_at(used) >= MemoryPressure::High {
            warn!(
                memory = self.id,
                bytes,
                used,
                capacity = self.capacity,
                "allocated memory under pressure"
            );
        } else {
            debug!(memory = self.id, bytes, used, "allocated memory");
        }

        Ok(())
    }

    /// Release `bytes`; never drives the consumed count below zero
    pub fn deallocate(&self, bytes: Size) {
        let mut consumed = self.consumed.lock();
        *consumed = consumed.saturating_sub(bytes);
        debug!(memory = self.id, bytes, used = *consumed, "deallocated memory");
    }

    pub fn stats(&self) -> MemoryStats {
        let consumed = *self.consumed.lock();
        MemoryStats {
            id: self.id,
            capacity: self.capacity,
            consumed,
            available: self.capacity - consumed,
            usage_percentage: usage(consumed, self.capacity),
        }
    }

    fn pressure_at(&self, used: Size) -> MemoryPressure {
        MemoryStats {
            id: self.id,
            capacity: self.capacity,
            consumed: used,
            available: self.capacity - used,
            usage_percentage: usage(used, self.capacity),
        }
        .memory_pressure()
    }
}

fn usage(used: Size, capacity: Size) -> f64 {
    if capacity == 0 {
        return 100.0;
    }
    (used as f64 / capacity as f64) * 100.0
}
