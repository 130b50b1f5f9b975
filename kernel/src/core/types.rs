/*!
 * Core Types
 * Common types used across the scheduler
 */

/// Process ID type
pub type Pid = u32;

/// Priority level (0-255, higher is more important)
///
/// Carried on every PCB as metadata; dispatch order is FIFO and never
/// consults it.
pub type Priority = u8;

/// Size type for memory operations (bytes)
pub type Size = usize;

/// Identifier of a simulated hardware unit (processor or memory slot)
pub type UnitId = u32;

/// Common result type for scheduler operations
pub type SchedResult<T> = Result<T, super::errors::SchedulerError>;
