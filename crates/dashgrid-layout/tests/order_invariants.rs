//! Property-style invariants for the slot order store.
//!
//! Random reorder/remove/front-insert streams are applied to a `SlotOrder`
//! and every step must leave a dense `0..N-1` permutation behind.

use dashgrid_layout::{MovedSlot, OrderError, Placement, SlotOrder, TileId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn fresh(n: usize) -> SlotOrder {
    SlotOrder::from_tiles((0..n as u64).map(TileId)).expect("fresh ids are unique")
}

fn placement() -> impl Strategy<Value = Placement> {
    prop_oneof![Just(Placement::Before), Just(Placement::After)]
}

fn assert_dense(order: &SlotOrder, expected_len: usize) {
    assert_eq!(order.len(), expected_len);
    assert!(order.is_dense(), "order lost density: {:?}", order.tiles());
    let mut seen: Vec<u64> = order.tiles().iter().map(|tile| tile.get()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), expected_len, "duplicate tile in {:?}", order.tiles());
}

#[derive(Debug, Clone)]
enum Op {
    Reorder {
        base: usize,
        moved: usize,
        placement: Placement,
    },
    Remove {
        slot: usize,
    },
    Front {
        base: usize,
        placement: Placement,
    },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..64, 0usize..64, placement()).prop_map(|(base, moved, placement)| Op::Reorder {
            base,
            moved,
            placement
        }),
        1 => (0usize..64).prop_map(|slot| Op::Remove { slot }),
        1 => (0usize..64, placement()).prop_map(|(base, placement)| Op::Front { base, placement }),
    ]
}

proptest! {
    #[test]
    fn reorder_preserves_dense_permutation(
        n in 1usize..24,
        base in 0usize..24,
        moved in 0usize..24,
        placement in placement(),
    ) {
        let base = base % n;
        let moved = moved % n;
        let mut order = fresh(n);
        let changes = order.reorder(base, moved, placement).expect("slots are in range");
        assert_dense(&order, n);
        for change in changes {
            prop_assert_eq!(order.slot_of(change.tile), Some(change.to));
        }
    }

    #[test]
    fn moved_tile_lands_next_to_base(
        n in 2usize..24,
        base in 0usize..24,
        moved in 0usize..24,
        placement in placement(),
    ) {
        let base = base % n;
        let moved = moved % n;
        prop_assume!(base != moved);
        let mut order = fresh(n);
        let base_tile = order.tile_at(base).expect("in range");
        let moved_tile = order.tile_at(moved).expect("in range");
        order.reorder(base, moved, placement).expect("slots are in range");

        let base_slot = order.slot_of(base_tile).expect("still present");
        let moved_slot = order.slot_of(moved_tile).expect("still present");
        match placement {
            Placement::Before => prop_assert_eq!(moved_slot + 1, base_slot),
            Placement::After => prop_assert_eq!(base_slot + 1, moved_slot),
        }
    }

    #[test]
    fn adjacent_swap_round_trips(
        n in 2usize..24,
        left in 0usize..23,
    ) {
        let left = left % (n - 1);
        let mut order = fresh(n);
        let original = order.tiles().to_vec();

        // Move the right neighbour in front of the left one...
        order.reorder(left, left + 1, Placement::Before).expect("in range");
        prop_assert_eq!(order.tile_at(left), Some(original[left + 1]));
        // ...then move it back behind its old neighbour.
        order.reorder(left + 1, left, Placement::After).expect("in range");
        prop_assert_eq!(order.tiles(), original.as_slice());
    }

    #[test]
    fn random_streams_keep_invariants(ops in prop::collection::vec(op(), 1..40)) {
        let mut order = fresh(8);
        let mut next_id = 100u64;
        for op in ops {
            let len = order.len();
            match op {
                Op::Reorder { base, moved, placement } => {
                    let result = order.reorder(base, moved, placement);
                    if base < len && moved < len {
                        prop_assert!(result.is_ok());
                    } else {
                        let out_of_range = matches!(result, Err(OrderError::SlotOutOfRange { .. }));
                        prop_assert!(out_of_range);
                    }
                    assert_dense(&order, len);
                }
                Op::Remove { slot } => {
                    match order.tile_at(slot) {
                        Some(tile) => {
                            let (freed, _) = order.remove(tile).expect("tile present");
                            prop_assert_eq!(freed, slot);
                            assert_dense(&order, len - 1);
                        }
                        None => assert_dense(&order, len),
                    }
                }
                Op::Front { base, placement } => {
                    let tile = TileId(next_id);
                    next_id += 1;
                    let result = order.reorder(base, MovedSlot::Front(tile), placement);
                    if base < len {
                        prop_assert!(result.is_ok());
                        assert_dense(&order, len + 1);
                        prop_assert!(order.contains(tile));
                    } else {
                        prop_assert!(result.is_err());
                        assert_dense(&order, len);
                    }
                }
            }
        }
    }
}

#[test]
fn five_tile_scenario() {
    let mut order = fresh(5);
    order.reorder(1, 3, Placement::Before).expect("in range");
    let slots: Vec<usize> = (0..5)
        .map(|raw| order.slot_of(TileId(raw)).expect("present"))
        .collect();
    assert_eq!(slots, vec![0, 2, 3, 1, 4]);
}

#[test]
fn insert_before_first_scenario() {
    let mut order = fresh(3);
    let incoming = TileId(42);
    order
        .reorder(0, MovedSlot::Front(incoming), Placement::After)
        .expect("in range");
    // Existing tiles shifted to 1..=3, the incoming tile entered at 0 and was
    // then moved behind the (bumped) base slot 1.
    assert_eq!(order.slot_of(TileId(0)), Some(0));
    assert_eq!(order.slot_of(incoming), Some(1));
    assert_eq!(order.slot_of(TileId(1)), Some(2));
    assert_eq!(order.slot_of(TileId(2)), Some(3));
}
