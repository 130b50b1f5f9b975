/*!
 * Run Slot Tests
 * Exactly one of INTERRUPT, WAIT or TERMINATE ends each RUNNING period
 */

use process_scheduler::process::{Completion, ComputeToken, PcbNotice, Process};
use process_scheduler::{
    DelayRange, Memory, PcbMeta, ProcessControlBlock, ProcessState, Processor, Transition,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn ending_transitions(rx: &mut mpsc::UnboundedReceiver<PcbNotice>) -> Vec<Transition> {
    let mut seen = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        if let PcbNotice::Changed(change) = notice {
            if change.from == ProcessState::Running {
                seen.push(change.transition);
            }
        }
    }
    seen
}

async fn run_once(quantum_ms: u64, computing_ms: u64) -> (ProcessState, Vec<Transition>) {
    let processor = Arc::new(Processor::new(Duration::from_secs(60)));
    let memory = Arc::new(Memory::new(1000));
    let process = Process::builder()
        .name("racer")
        .computing_time(Duration::from_millis(computing_ms))
        .simulated()
        .build()
        .unwrap();
    let pcb = ProcessControlBlock::new(
        PcbMeta::new(1, Duration::from_millis(quantum_ms), 1).with_memory_consumption(10),
        process,
        DelayRange::fixed(Duration::from_millis(10)),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    pcb.subscribe(tx);

    pcb.admit().unwrap();
    pcb.dispatch(&processor, &memory).unwrap();
    sleep(Duration::from_millis(quantum_ms.max(computing_ms) * 3 + 10)).await;

    assert_eq!(memory.consumed_memory(), 0);
    assert_eq!(processor.work_load(), Duration::from_secs(60));
    (pcb.state(), ending_transitions(&mut rx))
}

#[tokio::test(start_paused = true)]
async fn test_quantum_equal_to_computing_time_ends_once() {
    let (state, ended) = run_once(200, 200).await;

    assert_eq!(ended.len(), 1, "period ended by {ended:?}");
    match ended[0] {
        Transition::Interrupt => assert_eq!(state, ProcessState::Ready),
        Transition::Terminate => assert_eq!(state, ProcessState::Terminated),
        other => panic!("unexpected ending {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_each_period_ends_exactly_once() {
    for (quantum, computing) in [(10, 500), (500, 10), (50, 51), (51, 50), (1, 1), (300, 299)] {
        let (state, ended) = run_once(quantum, computing).await;
        assert_eq!(ended.len(), 1, "q={quantum} c={computing}: {ended:?}");

        let expected = if quantum < computing {
            ProcessState::Ready
        } else if quantum > computing {
            ProcessState::Terminated
        } else {
            state
        };
        assert_eq!(state, expected, "q={quantum} c={computing}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_zero_quantum_never_preempts() {
    let (state, ended) = run_once(0, 120).await;
    assert_eq!(state, ProcessState::Terminated);
    assert_eq!(ended, vec![Transition::Terminate]);
}

#[tokio::test(start_paused = true)]
async fn test_synchronous_completion_is_not_preempted() {
    let processor = Arc::new(Processor::new(Duration::from_secs(60)));
    let memory = Arc::new(Memory::new(1000));
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = starts.clone();

    let process = Process::builder()
        .name("instant")
        .computing_time(Duration::from_millis(400))
        .compute(move |_budget: Duration, done: Completion| {
            counter.fetch_add(1, Ordering::SeqCst);
            done.complete();
            ComputeToken::detached()
        })
        .build()
        .unwrap();
    let pcb = ProcessControlBlock::new(
        PcbMeta::new(9, Duration::from_millis(100), 1).with_memory_consumption(10),
        process,
        DelayRange::default(),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    pcb.subscribe(tx);

    pcb.admit().unwrap();
    pcb.dispatch(&processor, &memory).unwrap();
    assert_eq!(pcb.state(), ProcessState::Terminated);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(pcb.state(), ProcessState::Terminated);
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(ending_transitions(&mut rx), vec![Transition::Terminate]);
    assert_eq!(memory.consumed_memory(), 0);
    assert_eq!(processor.work_load(), Duration::from_secs(60));
}
