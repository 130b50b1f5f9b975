/*!
 * Resource Lease
 * Memory and processor capacity bound to one RUNNING period
 */

use crate::core::types::{SchedResult, Size};
use crate::memory::Memory;
use crate::processor::{Processor, Reservation};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resources held by a running process
///
/// Acquired by the dispatcher before START and released exactly once when
/// the RUNNING period ends: the bytes go back to the memory and the
/// processor reservation is cancelled. Dropping an unreleased lease
/// releases it.
#[derive(Debug)]
pub struct Lease {
    processor: Arc<Processor>,
    memory: Arc<Memory>,
    bytes: Size,
    reservation: Reservation,
    released: AtomicBool,
}

impl Lease {
    /// Allocate `bytes` from `memory` and reserve `duration` on `processor`
    ///
    /// Either both succeed or nothing stays allocated. `on_finish` runs if
    /// the processor time elapses before the lease is released.
    pub fn acquire<F>(
        processor: &Arc<Processor>,
        memory: &Arc<Memory>,
        bytes: Size,
        duration: Duration,
        on_finish: F,
    ) -> SchedResult<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        memory.allocate(bytes)?;

        let reservation = match processor.compute(duration, on_finish) {
            Ok(reservation) => reservation,
            Err(e) => {
                memory.deallocate(bytes);
                return Err(e);
            }
        };

        Ok(Self {
            processor: Arc::clone(processor),
            memory: Arc::clone(memory),
            bytes,
            reservation,
            released: AtomicBool::new(false),
        })
    }

    pub fn processor(&self) -> &Arc<Processor> {
        &self.processor
    }

    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    pub fn bytes(&self) -> Size {
        self.bytes
    }

    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reservation.cancel();
        self.memory.deallocate(self.bytes);
        debug!(
            processor = self.processor.id(),
            memory = self.memory.id(),
            bytes = self.bytes,
            "lease released"
        );
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release();
    }
}
