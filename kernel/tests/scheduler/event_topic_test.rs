/*!
 * Event Topic Tests
 * Fine-grained and coarse notifications emitted by the scheduler
 */

use pretty_assertions::assert_eq;
use process_scheduler::process::Process;
use process_scheduler::scheduler::{DEFERRED_TOPIC, ERROR_TOPIC, TRANSITION_TOPIC};
use process_scheduler::{
    PcbMeta, ProcessState, Scheduler, SchedulerConfig, SchedulerError, SchedulerEvent, Transition,
};
use std::time::Duration;
use tokio_stream::StreamExt;

fn process() -> Process {
    Process::builder()
        .name("observed")
        .computing_time(Duration::from_millis(10))
        .simulated()
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_schedule_emits_creation_then_coarse_transition() {
    let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
    let mut events = scheduler.subscribe();

    let pcb = scheduler.schedule(PcbMeta::new(7, Duration::from_millis(100), 1), process());

    let first = events.try_recv().unwrap();
    assert_eq!(first.topic(), "transition:new");
    match first {
        SchedulerEvent::Entered { pcb: created, from, to } => {
            assert_eq!(created.pid(), 7);
            assert_eq!(from, None);
            assert_eq!(to, ProcessState::New);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let second = events.try_recv().unwrap();
    assert_eq!(second.topic(), TRANSITION_TOPIC);
    assert_eq!(second.pcb().map(|p| p.pid()), Some(7));

    // Drawn from the configured range when not given
    let range = scheduler.config().memory_consumption;
    assert!(pcb.memory_consumption() >= range.min && pcb.memory_consumption() <= range.max);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_admission_emits_ready_topic() {
    let scheduler = Scheduler::new(
        SchedulerConfig::default().with_admission_interval(Duration::from_millis(10)),
    )
    .unwrap();
    let mut stream = scheduler.events();

    scheduler.schedule(PcbMeta::new(1, Duration::from_millis(100), 1), process());

    let mut topics = Vec::new();
    while topics.len() < 4 {
        let event = stream.next().await.unwrap().unwrap();
        topics.push(event.topic());
    }
    assert_eq!(
        topics,
        vec!["transition:new", TRANSITION_TOPIC, "transition:ready", TRANSITION_TOPIC]
    );
    assert_eq!(scheduler.locate(1), Some(ProcessState::Ready));

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_illegal_transition_before_dispatch_is_published() {
    let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
    let mut stream = scheduler.events();

    let pcb = scheduler.schedule(PcbMeta::new(3, Duration::from_millis(100), 1), process());
    assert!(pcb.resume().is_err());

    let error = loop {
        match stream.next().await.unwrap().unwrap() {
            SchedulerEvent::Error(e) => break e,
            _ => continue,
        }
    };
    assert_eq!(
        error,
        SchedulerError::IllegalTransition {
            pid: 3,
            transition: Transition::Resume,
            expected: ProcessState::Waiting,
            actual: ProcessState::New,
        }
    );
    assert_eq!(scheduler.stats().errors, 1);

    scheduler.shutdown().await;
}

#[test]
fn test_topic_names() {
    assert_eq!(DEFERRED_TOPIC, "dispatch:deferred");
    assert_eq!(ERROR_TOPIC, "error");
    let topics: Vec<_> = ProcessState::ALL.iter().map(ProcessState::topic).collect();
    assert_eq!(
        topics,
        vec![
            "transition:new",
            "transition:ready",
            "transition:running",
            "transition:waiting",
            "transition:terminated",
        ]
    );
}
