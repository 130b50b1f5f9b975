/*!
 * Resource Monitor Tests
 * Availability notifications and retry backoff
 */

use process_scheduler::{Memory, Processor, ResourceEvent, ResourceSystem, SchedulerError, SystemConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::sleep;

fn config() -> SystemConfig {
    SystemConfig::default().with_monitor_backoff(Duration::from_millis(200))
}

#[tokio::test(start_paused = true)]
async fn test_available_resources_are_announced_once() {
    let small = Arc::new(Processor::new(Duration::from_millis(10)));
    let large = Arc::new(Processor::new(Duration::from_millis(50)));
    let memory = Arc::new(Memory::new(4096));
    let system = ResourceSystem::new(vec![small, large.clone()], vec![memory.clone()], &config());
    let mut events = system.subscribe();

    match events.recv().await.unwrap() {
        ResourceEvent::ResourcesAvailable { processor, memory: slot } => {
            assert_eq!(processor.id(), large.id());
            assert_eq!(slot.id(), memory.id());
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The monitor stops after its first success
    sleep(Duration::from_secs(5)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_pools_retry_with_backoff() {
    let system = ResourceSystem::new(
        vec![Arc::new(Processor::new(Duration::from_secs(1)))],
        vec![],
        &config(),
    );
    let mut events = system.subscribe();

    let first = events.recv().await.unwrap();
    assert_eq!(first.topic(), "state:insufficient-resources");
    assert!(matches!(
        first,
        ResourceEvent::InsufficientResources(SchedulerError::NoMemoryAvailable)
    ));

    // Nothing more until the backoff elapses
    sleep(Duration::from_millis(150)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    sleep(Duration::from_millis(100)).await;
    assert!(matches!(
        events.try_recv(),
        Ok(ResourceEvent::InsufficientResources(_))
    ));

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_retrying() {
    let system = ResourceSystem::new(vec![], vec![], &config());
    let mut events = system.subscribe();

    assert!(events.recv().await.is_ok());
    system.shutdown().await;

    sleep(Duration::from_secs(2)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}
