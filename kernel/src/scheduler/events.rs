/*!
 * Scheduler Events
 * Notifications fanned out to scheduler subscribers
 */

use crate::core::errors::SchedulerError;
use crate::process::{ProcessControlBlock, ProcessState};
use std::sync::Arc;

/// Topic of the coarse transition notification
pub const TRANSITION_TOPIC: &str = "transition";
/// Topic of a dispatch attempt retried for lack of resources
pub const DEFERRED_TOPIC: &str = "dispatch:deferred";
/// Topic of reported errors
pub const ERROR_TOPIC: &str = "error";

#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A PCB entered the `to` queue (`transition:<state>`)
    ///
    /// `from` is `None` for the creation notification.
    Entered {
        pcb: Arc<ProcessControlBlock>,
        from: Option<ProcessState>,
        to: ProcessState,
    },
    /// Coarse notification following every `Entered`
    Transition {
        pcb: Arc<ProcessControlBlock>,
        to: ProcessState,
    },
    /// The head of READY could not be dispatched; it stays there
    Deferred {
        pcb: Arc<ProcessControlBlock>,
        error: SchedulerError,
    },
    Error(SchedulerError),
}

impl SchedulerEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Entered { to, .. } => to.topic(),
            Self::Transition { .. } => TRANSITION_TOPIC,
            Self::Deferred { .. } => DEFERRED_TOPIC,
            Self::Error(_) => ERROR_TOPIC,
        }
    }

    /// The PCB the event is about, if any
    pub fn pcb(&self) -> Option<&Arc<ProcessControlBlock>> {
        match self {
            Self::Entered { pcb, .. } | Self::Transition { pcb, .. } | Self::Deferred { pcb, .. } => {
                Some(pcb)
            }
            Self::Error(_) => None,
        }
    }
}
