/*!
 * Resource Events
 * Notifications published by the resource monitor
 */

use crate::core::errors::SchedulerError;
use crate::memory::Memory;
use crate::processor::Processor;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum ResourceEvent {
    /// Both pools produced a candidate
    ResourcesAvailable {
        processor: Arc<Processor>,
        memory: Arc<Memory>,
    },
    /// A selection failed; the monitor retries after its backoff
    InsufficientResources(SchedulerError),
}

impl ResourceEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            ResourceEvent::ResourcesAvailable { .. } => "state:resources-available",
            ResourceEvent::InsufficientResources(_) => "state:insufficient-resources",
        }
    }
}
