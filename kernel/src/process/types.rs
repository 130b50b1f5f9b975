/*!
 * Process Types
 * Metadata, notices and snapshots exchanged between PCBs and the scheduler
 */

use super::pcb::ProcessControlBlock;
use super::state::{ProcessState, Transition};
use crate::core::errors::SchedulerError;
use crate::core::types::{Pid, Priority, Size, UnitId};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::sync::Arc;
use std::time::Duration;

/// Scheduling metadata supplied with `schedule`
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcbMeta {
    pub pid: Pid,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub quantum: Duration,
    pub priority: Priority,
    /// Bytes held while running; drawn from the configured range when absent
    #[serde(default)]
    pub memory_consumption: Option<Size>,
}

impl PcbMeta {
    pub fn new(pid: Pid, quantum: Duration, priority: Priority) -> Self {
        Self {
            pid,
            quantum,
            priority,
            memory_consumption: None,
        }
    }

    #[must_use]
    pub fn with_memory_consumption(mut self, bytes: Size) -> Self {
        self.memory_consumption = Some(bytes);
        self
    }
}

/// A transition that completed
#[derive(Debug, Clone)]
pub struct StateChange {
    pub pcb: Arc<ProcessControlBlock>,
    pub transition: Transition,
    pub from: ProcessState,
    pub to: ProcessState,
}

/// What a PCB reports to its subscriber
#[derive(Debug, Clone)]
pub enum PcbNotice {
    Changed(StateChange),
    Failed(SchedulerError),
}

/// Serializable view of a PCB
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcbSnapshot {
    pub pid: Pid,
    pub name: String,
    pub file_name: String,
    pub state: ProcessState,
    pub priority: Priority,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub quantum: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub computing_time: Duration,
    pub memory_consumption: Size,
    pub needs_resource: bool,
    pub processor: Option<UnitId>,
    pub memory: Option<UnitId>,
    pub dispatches: u64,
}
