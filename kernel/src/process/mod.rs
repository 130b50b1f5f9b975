/*!
 * Process Module
 * Processes, their compute contract, and the PCB state machine
 */

pub mod compute;
pub mod pcb;
pub mod state;
pub mod types;
pub mod work;

pub use compute::{Completion, Compute, ComputeToken, SimulatedWork};
pub use pcb::ProcessControlBlock;
pub use state::{ProcessState, Transition};
pub use types::{PcbMeta, PcbNotice, PcbSnapshot, StateChange};
pub use work::{Process, ProcessBuilder};
