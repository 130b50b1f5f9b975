/*!
 * System Limits and Constants
 *
 * Centralized location for the defaults used by the simulated system.
 * Every value here can be overridden through `core::config`.
 */

use std::time::Duration;

// =============================================================================
// RESOURCE DEFAULTS
// =============================================================================

/// Capacity of the default primary memory slot (16KB)
/// Large enough for any default-sized process footprint
pub const DEFAULT_MEMORY_CAPACITY: usize = 16 * 1024;

/// Compute budget of the default processor (10 minutes of simulated work)
pub const DEFAULT_PROCESSOR_CAPACITY: Duration = Duration::from_secs(600);

/// Backoff between resource monitor attempts while the pools are exhausted
pub const DEFAULT_MONITOR_BACKOFF: Duration = Duration::from_millis(2000);

// =============================================================================
// SCHEDULER DEFAULTS
// =============================================================================

/// Polling interval of the admission loop (NEW -> READY)
pub const DEFAULT_ADMISSION_INTERVAL: Duration = Duration::from_millis(100);

/// Polling interval of each dispatch loop (READY -> RUNNING)
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Lower bound of the simulated external-event delay
pub const MIN_EXTERNAL_WAIT: Duration = Duration::from_millis(1);

/// Upper bound of the simulated external-event delay
pub const MAX_EXTERNAL_WAIT: Duration = Duration::from_millis(4000);

/// Smallest footprint drawn for a process without an explicit one
pub const MIN_MEMORY_CONSUMPTION: usize = 1;

/// Largest footprint drawn for a process without an explicit one
pub const MAX_MEMORY_CONSUMPTION: usize = 10_000;

// =============================================================================
// CHANNELS
// =============================================================================

/// Buffered notifications per broadcast channel before slow observers lag
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
