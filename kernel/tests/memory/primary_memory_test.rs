/*!
 * Primary Memory Tests
 * Allocation, exhaustion and release of a single memory slot
 */

use pretty_assertions::assert_eq;
use process_scheduler::{Memory, MemoryPressure, SchedulerError};

#[test]
fn test_allocation_beyond_capacity_is_refused() {
    let memory = Memory::new(1000);

    memory.allocate(400).expect("Failed to allocate 400 bytes");
    let err = memory.allocate(700).unwrap_err();

    assert_eq!(
        err,
        SchedulerError::ResourceExceeded {
            requested: 700,
            available: 600,
            consumed: 400,
            capacity: 1000,
        }
    );
    assert_eq!(memory.consumed_memory(), 400);
    assert_eq!(memory.available_memory(), 600);
}

#[test]
fn test_release_makes_room_again() {
    let memory = Memory::new(1000);
    memory.allocate(900).unwrap();
    assert!(memory.allocate(200).is_err());

    memory.deallocate(300);
    memory.allocate(200).expect("Freed bytes should be reusable");
    assert_eq!(memory.consumed_memory(), 800);
}

#[test]
fn test_zero_capacity_slot() {
    let memory = Memory::new(0);
    memory.allocate(0).expect("Empty allocation always fits");
    assert!(memory.allocate(1).is_err());
    assert_eq!(memory.stats().memory_pressure(), MemoryPressure::Critical);
}

#[test]
fn test_stats_track_usage() {
    let memory = Memory::new(200);
    memory.allocate(50).unwrap();

    let stats = memory.stats();
    assert_eq!(stats.capacity, 200);
    assert_eq!(stats.consumed, 50);
    assert_eq!(stats.available, 150);
    assert!((stats.usage_percentage - 25.0).abs() < f64::EPSILON);
    assert_eq!(stats.memory_pressure(), MemoryPressure::Low);
}
