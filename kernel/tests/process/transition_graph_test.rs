/*!
 * Transition Graph Tests
 * Arbitrary call sequences only ever follow the six lifecycle edges
 */

use process_scheduler::process::Process;
use process_scheduler::{
    DelayRange, Memory, PcbMeta, ProcessControlBlock, ProcessState, Processor, SchedulerError,
    Transition,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn transition() -> impl Strategy<Value = Transition> {
    prop::sample::select(Transition::ALL.to_vec())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("Failed to build runtime")
}

proptest! {
    #[test]
    fn calls_follow_the_graph(calls in prop::collection::vec(transition(), 1..40)) {
        runtime().block_on(async {
            let processor = Arc::new(Processor::new(Duration::from_secs(3600)));
            let memory = Arc::new(Memory::new(1 << 20));
            let process = Process::builder()
                .name("graph")
                .computing_time(Duration::from_secs(60))
                .simulated()
                .build()
                .unwrap();
            let pcb = ProcessControlBlock::new(
                PcbMeta::new(1, Duration::from_secs(30), 1).with_memory_consumption(64),
                process,
                DelayRange::fixed(Duration::from_secs(30)),
            );

            for call in calls {
                let before = pcb.state();
                let result = match call {
                    Transition::Admit => pcb.admit(),
                    Transition::Start => pcb.dispatch(&processor, &memory),
                    Transition::Interrupt => pcb.interrupt(),
                    Transition::Wait => pcb.wait(),
                    Transition::Resume => pcb.resume(),
                    Transition::Terminate => pcb.terminate(),
                };
                let after = pcb.state();

                if before == call.origin() {
                    prop_assert!(result.is_ok(), "{} from {} failed: {:?}", call, before, result);
                    prop_assert_eq!(after, call.target());
                    prop_assert_eq!(Transition::between(before, after), Some(call));
                } else {
                    let refused = matches!(result, Err(SchedulerError::IllegalTransition { .. }));
                    prop_assert!(refused, "{} from {} was not refused", call, before);
                    prop_assert_eq!(after, before);
                }

                prop_assert_eq!(pcb.assigned_memory().is_some(), after == ProcessState::Running);
                let expected_bytes = if after == ProcessState::Running { 64 } else { 0 };
                prop_assert_eq!(memory.consumed_memory(), expected_bytes);
            }
            Ok(())
        })?;
    }
}
