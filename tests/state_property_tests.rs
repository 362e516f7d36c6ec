//! Property tests for the core invariants
//!
//! Random operation sequences must never break slot/item consistency or
//! the energy bounds, and chain reactions must always terminate.

use proptest::prelude::*;

use merge_manor::core::sim::{GameSimulation, SimulationDeps};
use merge_manor::types::{BOARD_SLOT_COUNT, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};

const NOW: u64 = 1_700_000_000_000;

const SPAWNABLE: [&str; 8] = [
    "wood_1", "wood_2", "wood_5", "wood_8", "food_1", "ocean_2", "tech_3", "tech_6",
];

#[derive(Debug, Clone)]
enum Op {
    Spawn(usize),
    Drop { slot: usize, x: f32, y: f32 },
    Tick(u64),
    CompleteOrder(usize),
    GeneratorPull,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..SPAWNABLE.len()).prop_map(Op::Spawn),
        (
            0..BOARD_SLOT_COUNT,
            0.0..VIRTUAL_WIDTH,
            0.0..VIRTUAL_HEIGHT
        )
            .prop_map(|(slot, x, y)| Op::Drop { slot, x, y }),
        (1u64..200_000).prop_map(Op::Tick),
        (0usize..3).prop_map(Op::CompleteOrder),
        Just(Op::GeneratorPull),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_operations_preserve_invariants(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut sim = GameSimulation::new(SimulationDeps::simulated(5), NOW).unwrap();
        let mut now = NOW;

        for op in ops {
            match op {
                Op::Spawn(index) => {
                    sim.debug_spawn_item(SPAWNABLE[index]).unwrap();
                }
                Op::Drop { slot, x, y } => {
                    let uid = sim.state().board_slots[slot].clone();
                    if let Some(uid) = uid {
                        sim.drop_item(&uid, x, y).unwrap();
                    }
                }
                Op::Tick(delta) => {
                    now += delta;
                    sim.tick(now).unwrap();
                }
                Op::CompleteOrder(slot) => {
                    sim.try_complete_order(slot).unwrap();
                }
                Op::GeneratorPull => {
                    sim.try_generator_spawn("toolbox").unwrap();
                }
            }

            let state = sim.state();
            prop_assert!(state.check_slot_consistency().is_ok(), "slot/item invariant broken");
            prop_assert!(state.energy.current <= state.energy.max);
            prop_assert!(state.orders_active.len() == 3);
            prop_assert!(state.orders_queued.len() <= 2);
        }
    }

    #[test]
    fn chain_reactions_terminate_and_reduce_items(pairs in 1usize..14) {
        let mut sim = GameSimulation::new(SimulationDeps::simulated(9), NOW).unwrap();
        for _ in 0..(pairs * 2) {
            sim.debug_spawn_item("wood_1").unwrap();
        }
        let before = sim.state().items.len();
        prop_assert_eq!(before, pairs * 2);

        let source = sim.state().board_slots[0].clone().unwrap();
        let (x, y) = merge_manor::core::layout::board_slot_to_rect(1).center();
        sim.drop_item(&source, x, y).unwrap();

        // Every pass strictly reduces the population; 2^k tier-1 items can
        // never collapse below a single survivor per tier bucket
        let after = sim.state().items.len();
        prop_assert!(after < before);
        prop_assert!(sim.state().check_slot_consistency().is_ok());
    }
}
