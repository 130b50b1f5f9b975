/*!
 * Process States and Transitions
 * The six-edge lifecycle graph every PCB follows
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Created, not yet admitted
    New,
    /// Admitted and waiting for resources
    Ready,
    /// Bound to a processor and a memory slot
    Running,
    /// Blocked on a simulated external event
    Waiting,
    /// Finished; never leaves this state
    Terminated,
}

impl ProcessState {
    pub const ALL: [ProcessState; 5] = [
        ProcessState::New,
        ProcessState::Ready,
        ProcessState::Running,
        ProcessState::Waiting,
        ProcessState::Terminated,
    ];

    /// Fine-grained notification topic for entering this state
    pub fn topic(&self) -> &'static str {
        match self {
            ProcessState::New => "transition:new",
            ProcessState::Ready => "transition:ready",
            ProcessState::Running => "transition:running",
            ProcessState::Waiting => "transition:waiting",
            ProcessState::Terminated => "transition:terminated",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Terminated)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// The named edges of the lifecycle graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// NEW -> READY
    Admit,
    /// READY -> RUNNING
    Start,
    /// RUNNING -> READY (quantum elapsed)
    Interrupt,
    /// RUNNING -> WAITING (process needs an external resource)
    Wait,
    /// WAITING -> READY (external event arrived)
    Resume,
    /// RUNNING -> TERMINATED (work completed)
    Terminate,
}

impl Transition {
    pub const ALL: [Transition; 6] = [
        Transition::Admit,
        Transition::Start,
        Transition::Interrupt,
        Transition::Wait,
        Transition::Resume,
        Transition::Terminate,
    ];

    pub fn origin(&self) -> ProcessState {
        match self {
            Transition::Admit => ProcessState::New,
            Transition::Start => ProcessState::Ready,
            Transition::Interrupt | Transition::Wait | Transition::Terminate => {
                ProcessState::Running
            }
            Transition::Resume => ProcessState::Waiting,
        }
    }

    pub fn target(&self) -> ProcessState {
        match self {
            Transition::Admit | Transition::Interrupt | Transition::Resume => ProcessState::Ready,
            Transition::Start => ProcessState::Running,
            Transition::Wait => ProcessState::Waiting,
            Transition::Terminate => ProcessState::Terminated,
        }
    }

    /// The edge joining two states, if the graph has one
    pub fn between(from: ProcessState, to: ProcessState) -> Option<Transition> {
        Self::ALL
            .into_iter()
            .find(|t| t.origin() == from && t.target() == to)
    }

    /// Whether the queue migration engine re-files the PCB for this edge
    ///
    /// ADMIT and START are spliced by the admission and dispatch loops
    /// themselves.
    #[inline]
    pub fn is_reported(&self) -> bool {
        !matches!(self, Transition::Admit | Transition::Start)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Transition::Admit => "admit",
            Transition::Start => "start",
            Transition::Interrupt => "interrupt",
            Transition::Wait => "wait",
            Transition::Resume => "resume",
            Transition::Terminate => "terminate",
        };
        f.write_str(verb)
    }
}
