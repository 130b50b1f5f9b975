/*!
 * State Queues
 * One FIFO queue per process state
 */

use crate::core::types::Pid;
use crate::process::{ProcessControlBlock, ProcessState};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::warn;

/// Queue lengths at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLengths {
    pub new: usize,
    pub ready: usize,
    pub running: usize,
    pub waiting: usize,
    pub terminated: usize,
}

/// Mapping from state to the PCBs currently in it, in arrival order
#[derive(Debug)]
pub struct Queues {
    queues: HashMap<ProcessState, VecDeque<Arc<ProcessControlBlock>>>,
}

impl Default for Queues {
    fn default() -> Self {
        Self::new()
    }
}

impl Queues {
    pub fn new() -> Self {
        let queues = ProcessState::ALL
            .iter()
            .map(|state| (*state, VecDeque::new()))
            .collect();
        Self { queues }
    }

    fn queue_mut(&mut self, state: ProcessState) -> &mut VecDeque<Arc<ProcessControlBlock>> {
        self.queues.entry(state).or_default()
    }

    pub fn push(&mut self, state: ProcessState, pcb: Arc<ProcessControlBlock>) {
        self.queue_mut(state).push_back(pcb);
    }

    pub fn front(&self, state: ProcessState) -> Option<&Arc<ProcessControlBlock>> {
        self.queues.get(&state).and_then(VecDeque::front)
    }

    pub fn pop_front(&mut self, state: ProcessState) -> Option<Arc<ProcessControlBlock>> {
        self.queue_mut(state).pop_front()
    }

    /// Take `pid` out of the `state` queue
    pub fn remove(&mut self, state: ProcessState, pid: Pid) -> Option<Arc<ProcessControlBlock>> {
        let queue = self.queue_mut(state);
        let pos = queue.iter().position(|pcb| pcb.pid() == pid)?;
        queue.remove(pos)
    }

    /// Move `pid` from the `from` queue to the back of the `to` queue
    ///
    /// Falls back to a scan of every queue when the PCB is not where the
    /// caller expected it. Returns `false` if it is in no queue at all.
    pub fn migrate(&mut self, pid: Pid, from: ProcessState, to: ProcessState) -> bool {
        let pcb = match self.remove(from, pid) {
            Some(pcb) => pcb,
            None => {
                let found = ProcessState::ALL
                    .iter()
                    .find_map(|state| self.remove(*state, pid).map(|pcb| (*state, pcb)));
                match found {
                    Some((actual, pcb)) => {
                        warn!(pid, expected = %from, %actual, "pcb found outside its expected queue");
                        pcb
                    }
                    None => return false,
                }
            }
        };

        self.push(to, pcb);
        true
    }

    pub fn len(&self, state: ProcessState) -> usize {
        self.queues.get(&state).map_or(0, VecDeque::len)
    }

    /// Snapshot of the `state` queue, head first
    pub fn snapshot(&self, state: ProcessState) -> Vec<Arc<ProcessControlBlock>> {
        self.queues
            .get(&state)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn lengths(&self) -> QueueLengths {
        QueueLengths {
            new: self.len(ProcessState::New),
            ready: self.len(ProcessState::Ready),
            running: self.len(ProcessState::Running),
            waiting: self.len(ProcessState::Waiting),
            terminated: self.len(ProcessState::Terminated),
        }
    }
}
