/*!
 * Processor Module
 * Capacity-bounded compute-time allocation
 */

pub mod reservation;
pub mod unit;

// Re-export for convenience
pub use reservation::Reservation;
pub use unit::{Processor, ProcessorStats};
