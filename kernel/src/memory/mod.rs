/*!
 * Memory Module
 * Capacity-bounded primary memory slots
 */

pub mod primary;
pub mod types;

// Re-export for convenience
pub use primary::Memory;
pub use types::*;
