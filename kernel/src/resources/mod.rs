/*!
 * Resources Module
 * Resource pools, availability monitoring and leases
 */

pub mod events;
pub mod lease;
pub mod system;

// Re-export for convenience
pub use events::ResourceEvent;
pub use lease::Lease;
pub use system::ResourceSystem;
