/*!
 * Memory Invariant Tests
 * Property tests over arbitrary allocate/deallocate sequences
 */

use process_scheduler::Memory;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    Deallocate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..600).prop_map(Op::Allocate),
        (0usize..600).prop_map(Op::Deallocate),
        (usize::MAX - 600..=usize::MAX).prop_map(Op::Allocate),
        (usize::MAX - 600..=usize::MAX).prop_map(Op::Deallocate),
    ]
}

proptest! {
    #[test]
    fn consumed_stays_within_capacity(capacity in 0usize..2000, ops in prop::collection::vec(op(), 0..64)) {
        let memory = Memory::new(capacity);
        let mut model = 0usize;

        for op in ops {
            match op {
                Op::Allocate(n) => {
                    let fits = model.checked_add(n).is_some_and(|total| total <= capacity);
                    prop_assert_eq!(memory.allocate(n).is_ok(), fits);
                    if fits {
                        model += n;
                    }
                }
                Op::Deallocate(n) => {
                    memory.deallocate(n);
                    model = model.saturating_sub(n);
                }
            }

            prop_assert_eq!(memory.consumed_memory(), model);
            prop_assert!(memory.consumed_memory() <= memory.capacity());
            prop_assert_eq!(memory.available_memory(), capacity - model);
        }
    }
}
