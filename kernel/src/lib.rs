/*!
 * Process Scheduler Library
 * Simulated preemptive, resource-constrained process scheduling
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod processor;
pub mod resources;
pub mod scheduler;
pub mod task;

// Re-exports
pub use crate::core::{
    ByteRange, Config, DelayRange, Pid, Priority, SchedResult, SchedulerConfig, SchedulerError,
    Size, SystemConfig,
};
pub use memory::{Memory, MemoryPressure, MemoryStats};
pub use process::{
    Completion, Compute, ComputeToken, PcbMeta, PcbSnapshot, Process, ProcessControlBlock,
    ProcessState, SimulatedWork, Transition,
};
pub use processor::{Processor, ProcessorStats};
pub use resources::{Lease, ResourceEvent, ResourceSystem};
pub use scheduler::{Scheduler, SchedulerEvent, SchedulerStats};
