//! Scenario tests through the public facade
//!
//! These exercise the simulation the way a host would: public operations
//! and pointer coordinates only, no reaching into internals.

use merge_manor::core::layout::board_slot_to_rect;
use merge_manor::core::sim::{GameSimulation, SimulationDeps};
use merge_manor::types::{ContainerKind, DropOutcome, TRASH_RECT};

const NOW: u64 = 1_700_000_000_000;
const HOUR_MS: u64 = 60 * 60 * 1000;

fn new_sim() -> GameSimulation {
    GameSimulation::new(SimulationDeps::simulated(11), NOW).unwrap()
}

#[test]
fn fresh_state_matches_contract() {
    let sim = new_sim();
    let state = sim.state();

    assert_eq!(state.player.level, 1);
    assert_eq!(state.energy.current, state.energy.max);
    assert_eq!(state.orders_active.len(), 3);
    assert_eq!(state.orders_queued.len(), 2);
    assert!(state.items.is_empty());
}

#[test]
fn adjacent_wood_items_merge_to_next_tier() {
    let mut sim = new_sim();
    assert!(sim.debug_spawn_item("wood_1").unwrap());
    assert!(sim.debug_spawn_item("wood_1").unwrap());

    let state = sim.state();
    let source = state.board_slots[0].clone().unwrap();
    let (x, y) = board_slot_to_rect(1).center();
    let count_before = state.items.len();

    let outcome = sim.drop_item(&source, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Merged);

    let state = sim.state();
    assert_eq!(state.items.len(), count_before - 1);
    let merged_uid = state.board_slots[1].as_ref().unwrap();
    let merged = &state.items[merged_uid];
    assert_eq!(merged.item_id, "wood_2");
    assert_eq!(merged.tier, 2);
    assert!(state.board_slots[0].is_none());
}

#[test]
fn trash_drop_grants_sell_value() {
    let mut sim = new_sim();
    assert!(sim.debug_spawn_item("wood_4").unwrap());
    let uid = sim.state().board_slots[0].clone().unwrap();
    let coins_before = sim.state().player.coins;

    let (x, y) = TRASH_RECT.center();
    let outcome = sim.drop_item(&uid, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Scrapped);
    assert_eq!(sim.state().player.coins, coins_before + 20);
    assert!(sim.item(&uid).is_none());
}

#[test]
fn all_orders_rotate_after_a_day() {
    let mut sim = new_sim();
    let before: Vec<String> = sim
        .state()
        .orders_active
        .iter()
        .map(|order| order.instance_id.clone())
        .collect();

    sim.tick(NOW + 25 * HOUR_MS).unwrap();

    let state = sim.state();
    for (index, order) in state.orders_active.iter().enumerate() {
        assert_ne!(order.instance_id, before[index], "slot {index} should rotate");
    }
    assert_eq!(state.orders_queued.len(), 2);
}

#[test]
fn forced_echo_expires_back_to_normal_item() {
    let mut sim = new_sim();
    assert!(sim.debug_spawn_item("wood_6").unwrap());
    assert!(sim.force_echo_on_random_eligible().unwrap());

    let echo_uid = sim.state().echo.active_echo_ids[0].clone();
    let echo_slot = sim.state().items[&echo_uid].slot_index;
    let lifetime = sim.state().config.echo.echo_lifetime_hours * HOUR_MS;

    sim.tick(NOW + lifetime + 60_000).unwrap();

    let state = sim.state();
    let item = &state.items[&echo_uid];
    assert!(!item.is_echo);
    assert_eq!(item.slot_index, echo_slot);
    assert_eq!(item.container, ContainerKind::Board);
    assert!(state.echo.active_echo_ids.is_empty());
}

#[test]
fn energy_stays_in_bounds_across_operations() {
    let mut sim = new_sim();
    for round in 0..20 {
        for generator_id in sim.ready_generator_ids(sim.state().now) {
            sim.try_generator_spawn(&generator_id).unwrap();
        }
        sim.tick(NOW + (round + 1) * 10 * HOUR_MS).unwrap();
        let energy = sim.state().energy;
        assert!(energy.current <= energy.max);
    }
}

#[test]
fn generator_spawn_populates_first_free_board_slot() {
    let mut sim = new_sim();
    let outcome = sim.try_generator_spawn("toolbox").unwrap();
    assert!(outcome.ok());

    let state = sim.state();
    let uid = state.board_slots[0].as_ref().expect("slot 0 filled first");
    let item = &state.items[uid];
    assert_eq!(item.container, ContainerKind::Board);
    assert_eq!(item.source_generator_id.as_deref(), Some("toolbox"));
}

#[test]
fn subscriber_observes_every_commit() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut sim = new_sim();
    let commits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&commits);
    sim.subscribe(Box::new(move |state| {
        sink.borrow_mut().push(state.items.len());
    }));

    sim.debug_spawn_item("wood_1").unwrap();
    sim.debug_spawn_item("wood_1").unwrap();

    assert_eq!(*commits.borrow(), vec![0, 1, 2]);
}
