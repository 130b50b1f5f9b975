/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::{Pid, Size, UnitId};
use crate::process::{ProcessState, Transition};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Scheduler errors with serialization support
///
/// Every variant is `Clone` so it can be fanned out over the broadcast
/// notification channels.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("The available memory has been exceeded: requested {requested} bytes, available {available} bytes ({consumed} used / {capacity} total)")]
    #[diagnostic(
        code(memory::resource_exceeded),
        help("The memory was not allocated. Wait for running processes to release their memory.")
    )]
    ResourceExceeded {
        requested: Size,
        available: Size,
        consumed: Size,
        capacity: Size,
    },

    #[error("Insufficient processor capacity: requested {requested:?}, remaining {remaining:?}")]
    #[diagnostic(
        code(processor::insufficient_capacity),
        help("No capacity was reserved. The dispatch is retried on the next tick.")
    )]
    InsufficientCapacity {
        requested: Duration,
        remaining: Duration,
    },

    #[error("No processors are available to be assigned")]
    #[diagnostic(
        code(system::no_processor_available),
        help("The processor pool is empty. Register at least one processor.")
    )]
    NoProcessorAvailable,

    #[error("There is no memory available")]
    #[diagnostic(
        code(system::no_memory_available),
        help("Every memory slot is full or the pool is empty.")
    )]
    NoMemoryAvailable,

    #[error("Memory slot {0} is not part of this system")]
    #[diagnostic(
        code(system::unknown_memory_slot),
        help("Release memory through the slot returned by allocate_memory.")
    )]
    UnknownMemorySlot(UnitId),

    #[error("Cannot {transition} process {pid}: expected state {expected}, found {actual}")]
    #[diagnostic(
        code(pcb::illegal_transition),
        help("The transition was ignored and the process state is unchanged.")
    )]
    IllegalTransition {
        pid: Pid,
        transition: Transition,
        expected: ProcessState,
        actual: ProcessState,
    },

    #[error("Invalid compute contract: {0}")]
    #[diagnostic(
        code(process::invalid_compute_contract),
        help("Supply a compute contract that receives exactly one completion callback.")
    )]
    InvalidComputeContract(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(config::invalid),
        help("Review the configuration file and the SCHED_* environment variables.")
    )]
    Configuration(String),
}

impl SchedulerError {
    /// Resource exhaustion is retried by the polling loops instead of surfaced
    #[inline]
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            SchedulerError::ResourceExceeded { .. }
                | SchedulerError::InsufficientCapacity { .. }
                | SchedulerError::NoProcessorAvailable
                | SchedulerError::NoMemoryAvailable
        )
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::Configuration(err.to_string())
    }
}
