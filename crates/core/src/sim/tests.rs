//! Simulation scenario tests
//!
//! End-to-end exercises of the public operations against a simulated
//! dependency set, plus targeted checks of the tick sub-steps.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use merge_manor_types::{
    ContainerKind, DropOutcome, EchoOption, ECHO_SLOT_RECT, ORDER_DROP_RECT, TRASH_RECT,
};

use crate::collab::{AdPlacement, AdPolicy, AdProvider, AdResult, AlwaysDeny};
use crate::layout::board_slot_to_rect;
use crate::save::{KeyValueStore, SaveService};
use crate::state::OrderInstance;

use super::{GameSimulation, SimulationDeps, SpawnOutcome, SpawnRejection};

const NOW: u64 = 1_700_000_000_000;
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Key-value store shareable between sessions, for save/restore tests
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<HashMap<String, String>>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.0.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.0.borrow_mut().remove(key);
    }
}

/// Ad provider that always fills, for flows where the 90% fill rate of the
/// simulated provider would make assertions flaky
struct AlwaysFillAds;

impl AdProvider for AlwaysFillAds {
    fn watch(&mut self, _placement: AdPlacement, _now_ms: u64, _policy: AdPolicy) -> AdResult {
        AdResult {
            success: true,
            reason: None,
        }
    }
}

fn new_sim() -> GameSimulation {
    GameSimulation::new(SimulationDeps::simulated(7), NOW).unwrap()
}

fn deps_with(store: SharedStore) -> SimulationDeps {
    let mut deps = SimulationDeps::simulated(7);
    deps.save = SaveService::new(Box::new(store));
    deps
}

fn spawn_board(sim: &mut GameSimulation, item_id: &str, slot: usize) -> String {
    let state = sim.store.state_mut();
    sim.ctx
        .spawn_item(state, item_id, ContainerKind::Board, slot, None, false, None)
        .unwrap()
        .uid
}

fn spawn_inventory(sim: &mut GameSimulation, item_id: &str, slot: usize) -> String {
    let state = sim.store.state_mut();
    sim.ctx
        .spawn_item(state, item_id, ContainerKind::Inventory, slot, None, false, None)
        .unwrap()
        .uid
}

fn board_center(slot: usize) -> (f32, f32) {
    board_slot_to_rect(slot).center()
}

fn known_order(sim: &GameSimulation, definition_id: &str) -> OrderInstance {
    OrderInstance {
        instance_id: format!("order_test_{definition_id}"),
        definition_id: definition_id.to_string(),
        order_type: sim.ctx.content.order(definition_id).unwrap().order_type,
        created_at: NOW,
        expires_at: None,
        forced_at: NOW,
    }
}

#[test]
fn test_fresh_session_scenario() {
    let sim = new_sim();
    let state = sim.state();

    assert_eq!(state.player.level, 1);
    assert_eq!(state.energy.current, state.energy.max);
    assert_eq!(state.orders_active.len(), 3);
    assert_eq!(state.orders_queued.len(), 2);
    assert!(state.items.is_empty());
    assert!(state.check_slot_consistency().is_ok());
}

#[test]
fn test_fresh_slot_zero_order_is_easy() {
    let sim = new_sim();
    let first = &sim.state().orders_active[0];
    let definition = sim.ctx.content.order(&first.definition_id).unwrap();
    assert!(definition.is_easy());
}

#[test]
fn test_generator_spawn_flow() {
    let mut sim = new_sim();
    let energy_before = sim.state().energy.current;

    let outcome = sim.try_generator_spawn("toolbox").unwrap();
    assert!(outcome.ok());
    assert_eq!(sim.state().energy.current, energy_before - 1);
    assert_eq!(sim.state().items.len(), 1);
    assert!(sim.state().generators["toolbox"].cooldown_end_at > NOW);
    assert!(sim.state().check_slot_consistency().is_ok());

    // Second spawn is blocked by the cooldown
    let blocked = sim.try_generator_spawn("toolbox").unwrap();
    assert_eq!(blocked, SpawnOutcome::Rejected(SpawnRejection::Cooldown));
}

#[test]
fn test_generator_spawn_requires_energy() {
    let mut sim = new_sim();
    sim.store.state_mut().energy.current = 0;
    let outcome = sim.try_generator_spawn("toolbox").unwrap();
    assert_eq!(outcome, SpawnOutcome::Rejected(SpawnRejection::NotEnoughEnergy));
}

#[test]
fn test_generator_spawn_unknown_id_is_rejection() {
    let mut sim = new_sim();
    let outcome = sim.try_generator_spawn("replicator").unwrap();
    assert_eq!(outcome, SpawnOutcome::Rejected(SpawnRejection::UnknownGenerator));
}

#[test]
fn test_merge_two_tier_one_items() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_1", 0);
    let _b = spawn_board(&mut sim, "wood_1", 1);
    assert_eq!(sim.state().items.len(), 2);

    let (x, y) = board_center(1);
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Merged);

    let state = sim.state();
    assert_eq!(state.items.len(), 1);
    let merged = state.items.values().next().unwrap();
    assert_eq!(merged.item_id, "wood_2");
    assert_eq!(merged.tier, 2);
    assert_eq!(merged.slot_index, 1);
    assert_eq!(merged.container, ContainerKind::Board);
    assert!(state.board_slots[0].is_none());
    assert!(state.check_slot_consistency().is_ok());
}

#[test]
fn test_merge_inherits_generator_attribution() {
    let mut sim = new_sim();
    let a = {
        let state = sim.store.state_mut();
        sim.ctx
            .spawn_item(
                state,
                "wood_1",
                ContainerKind::Board,
                0,
                Some("toolbox".to_string()),
                false,
                None,
            )
            .unwrap()
            .uid
    };
    let _b = spawn_board(&mut sim, "wood_1", 1);

    let (x, y) = board_center(1);
    sim.drop_item(&a, x, y).unwrap();
    let merged = sim.state().items.values().next().unwrap();
    assert_eq!(merged.source_generator_id.as_deref(), Some("toolbox"));
}

#[test]
fn test_mismatched_items_swap_instead_of_merging() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_1", 0);
    let b = spawn_board(&mut sim, "food_1", 1);

    let (x, y) = board_center(1);
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Moved);

    let state = sim.state();
    assert_eq!(state.items[&a].slot_index, 1);
    assert_eq!(state.items[&b].slot_index, 0);
    assert!(state.check_slot_consistency().is_ok());
}

#[test]
fn test_max_tier_items_never_merge() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_8", 0);
    let _b = spawn_board(&mut sim, "wood_8", 1);

    let (x, y) = board_center(1);
    let outcome = sim.drop_item(&a, x, y).unwrap();
    // Falls through to a swap; both terminal items survive
    assert_eq!(outcome, DropOutcome::Moved);
    assert_eq!(sim.state().items.len(), 2);
}

#[test]
fn test_chain_reaction_cascades_upward() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_1", 0);
    let _ = spawn_board(&mut sim, "wood_1", 1);
    let _ = spawn_board(&mut sim, "wood_1", 2);
    let _ = spawn_board(&mut sim, "wood_1", 3);

    let (x, y) = board_center(1);
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Merged);

    // Four tier-1 items collapse into a single tier-3 item
    let state = sim.state();
    assert_eq!(state.items.len(), 1);
    let survivor = state.items.values().next().unwrap();
    assert_eq!(survivor.item_id, "wood_3");
    assert!(state.check_slot_consistency().is_ok());
}

#[test]
fn test_move_to_empty_slot() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_1", 0);

    let (x, y) = board_center(10);
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Moved);
    assert_eq!(sim.state().items[&a].slot_index, 10);
    assert!(sim.state().board_slots[0].is_none());
}

#[test]
fn test_move_to_inventory_stamps_expiry() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_1", 0);
    assert!(sim.state().items[&a].inventory_expires_at.is_none());

    let rect = crate::layout::inventory_slot_to_rect(0);
    let (x, y) = rect.center();
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Moved);

    let item = &sim.state().items[&a];
    assert_eq!(item.container, ContainerKind::Inventory);
    assert!(item.inventory_expires_at.is_some());
}

#[test]
fn test_trash_drop_scraps_for_sell_value() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_3", 0);
    let coins_before = sim.state().player.coins;

    let (x, y) = TRASH_RECT.center();
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Scrapped);
    assert_eq!(sim.state().player.coins, coins_before + 8);
    assert!(sim.state().items.is_empty());
}

#[test]
fn test_high_tier_scrap_respects_denial() {
    let mut deps = SimulationDeps::simulated(7);
    deps.confirm = Box::new(AlwaysDeny);
    let mut sim = GameSimulation::new(deps, NOW).unwrap();

    let a = spawn_board(&mut sim, "wood_5", 0);
    let (x, y) = TRASH_RECT.center();
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Invalid);
    assert_eq!(sim.state().items.len(), 1);
}

#[test]
fn test_bulk_scrap_low_tier_only() {
    let mut sim = new_sim();
    spawn_board(&mut sim, "wood_1", 0);
    spawn_board(&mut sim, "wood_2", 1);
    spawn_board(&mut sim, "wood_5", 2);
    let coins_before = sim.state().player.coins;

    let granted = sim.bulk_scrap_low_tier();
    assert_eq!(granted, 1 + 3);
    assert_eq!(sim.state().player.coins, coins_before + 4);
    assert_eq!(sim.state().items.len(), 1);
}

#[test]
fn test_order_completion_consumes_and_rewards() {
    let mut sim = new_sim();
    let order = known_order(&sim, "welcome_repairs");
    sim.store.state_mut().orders_active[0] = order;
    spawn_board(&mut sim, "wood_1", 0);
    spawn_board(&mut sim, "wood_1", 1);
    let coins_before = sim.state().player.coins;

    assert!(sim.try_complete_order(0).unwrap());

    let state = sim.state();
    assert!(state.items.is_empty());
    assert_eq!(state.player.coins, coins_before + 30);
    assert_eq!(state.player.stars, 5);
    assert_eq!(state.player.xp, 40);
    assert_eq!(state.orders_active.len(), 3);
    assert_eq!(state.orders_queued.len(), 2);
    // welcome_repairs delivers its letter
    assert!(state.letters.iter().any(|letter| letter.id == "hall_first_order"));
}

#[test]
fn test_order_completion_is_atomic() {
    let mut sim = new_sim();
    let order = known_order(&sim, "welcome_repairs");
    sim.store.state_mut().orders_active[0] = order.clone();
    // Only one of the two required items
    spawn_board(&mut sim, "wood_1", 0);
    let coins_before = sim.state().player.coins;

    assert!(!sim.try_complete_order(0).unwrap());

    let state = sim.state();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.player.coins, coins_before);
    assert_eq!(state.player.xp, 0);
    assert_eq!(state.orders_active[0].instance_id, order.instance_id);
}

#[test]
fn test_order_drop_zone_completes_matching_order() {
    let mut sim = new_sim();
    let order = known_order(&sim, "welcome_repairs");
    sim.store.state_mut().orders_active[0] = order;
    let a = spawn_board(&mut sim, "wood_1", 0);
    spawn_board(&mut sim, "wood_1", 1);

    let (x, y) = ORDER_DROP_RECT.center();
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::OrderDrop);
    assert!(sim.state().items.is_empty());
}

#[test]
fn test_order_drop_zone_rejects_when_unfillable() {
    let mut sim = new_sim();
    let order = known_order(&sim, "welcome_repairs");
    sim.store.state_mut().orders_active[0] = order;
    // Replace the other slots so the dragged item cannot match them
    let filler = known_order(&sim, "welcome_repairs");
    sim.store.state_mut().orders_active[1] = filler.clone();
    sim.store.state_mut().orders_active[2] = filler;
    let a = spawn_board(&mut sim, "wood_1", 0);

    let (x, y) = ORDER_DROP_RECT.center();
    let outcome = sim.drop_item(&a, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Invalid);
    assert_eq!(sim.state().items.len(), 1);
}

#[test]
fn test_timed_order_expiry_replaces_and_refills() {
    let mut sim = new_sim();
    let stale_id = {
        let state = sim.store.state_mut();
        state.orders_active[0].expires_at = Some(NOW - 1);
        state.orders_active[0].instance_id.clone()
    };

    sim.tick(NOW + 16).unwrap();

    let state = sim.state();
    assert_ne!(state.orders_active[0].instance_id, stale_id);
    assert_eq!(state.orders_queued.len(), 2);
    assert!(state
        .ui
        .toasts
        .iter()
        .any(|toast| toast.text.contains("Timed order expired")));
}

#[test]
fn test_unforced_order_rotates_after_24h() {
    let mut sim = new_sim();
    let stale_id = {
        let state = sim.store.state_mut();
        state.orders_active[1].forced_at = NOW - DAY_MS;
        state.orders_active[1].instance_id.clone()
    };

    sim.tick(NOW + 16).unwrap();
    assert_ne!(sim.state().orders_active[1].instance_id, stale_id);
}

#[test]
fn test_reroll_free_then_gems() {
    let mut sim = new_sim();
    assert!(sim.reroll_order(1).unwrap());
    assert!(sim.state().reroll.free_used);
    assert_eq!(sim.state().player.gems, 30);

    assert!(sim.reroll_order(1).unwrap());
    assert_eq!(sim.state().player.gems, 20);
    assert_eq!(sim.state().reroll.gem_cost, 15);

    assert!(sim.reroll_order(1).unwrap());
    assert_eq!(sim.state().player.gems, 5);
    assert_eq!(sim.state().reroll.gem_cost, 20);

    // 5 gems cannot cover the 20-gem cost
    assert!(!sim.reroll_order(1).unwrap());
    assert_eq!(sim.state().player.gems, 5);
}

#[test]
fn test_energy_regen_preserves_remainder() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        state.energy.current = 50;
        state.energy.last_tick_at = NOW;
    }

    // 2.5 regen intervals at 90s each
    sim.tick(NOW + 225_000).unwrap();
    let energy = sim.state().energy;
    assert_eq!(energy.current, 52);
    assert_eq!(energy.last_tick_at, NOW + 180_000);
}

#[test]
fn test_energy_never_exceeds_max() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        state.energy.current = 99;
        state.energy.last_tick_at = NOW;
    }
    sim.tick(NOW + 10 * 90_000).unwrap();
    assert_eq!(sim.state().energy.current, sim.state().energy.max);
}

#[test]
fn test_offline_catch_up_is_capped() {
    let store = SharedStore::default();
    let mut sim = GameSimulation::new(deps_with(store.clone()), NOW).unwrap();
    {
        let state = sim.store.state_mut();
        state.energy.current = 10;
        state.energy.last_tick_at = NOW;
    }
    sim.save_now();

    // 100 intervals elapse offline; the cap allows 40
    let later = NOW + 100 * 90_000;
    let resumed = GameSimulation::new(deps_with(store), later).unwrap();
    assert_eq!(resumed.state().energy.current, 50);
    assert_eq!(resumed.state().energy.last_tick_at, later);
    assert!(resumed
        .state()
        .ui
        .toasts
        .iter()
        .any(|toast| toast.text.contains("Offline regen +40")));
}

#[test]
fn test_daily_reset_is_idempotent_within_a_day() {
    let mut sim = new_sim();
    let next_day = NOW + DAY_MS;
    sim.tick(next_day).unwrap();

    let live_ops_after_first = sim.state().live_ops.clone();
    let reroll_after_first = sim.state().reroll;

    sim.tick(next_day + 16).unwrap();
    assert_eq!(sim.state().live_ops, live_ops_after_first);
    assert_eq!(sim.state().reroll, reroll_after_first);
}

#[test]
fn test_login_streak_increments_and_resets() {
    let mut sim = new_sim();

    sim.tick(NOW + DAY_MS).unwrap();
    assert_eq!(sim.state().live_ops.login_streak, 2);
    assert!(!sim.state().live_ops.login_claimed_today);

    assert!(sim.claim_login_reward());
    assert_eq!(sim.state().player.stars, 20);
    assert!(!sim.claim_login_reward());

    // A two-day gap resets the streak
    sim.tick(NOW + 4 * DAY_MS).unwrap();
    assert_eq!(sim.state().live_ops.login_streak, 1);
}

#[test]
fn test_daily_tasks_complete_and_chest_claims_once() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        for task in &mut state.live_ops.daily_tasks {
            task.progress = task.target;
            task.complete = true;
        }
    }
    let coins_before = sim.state().player.coins;
    assert!(sim.claim_daily_bonus_chest());
    assert_eq!(sim.state().player.coins, coins_before + 200);
    assert!(!sim.claim_daily_bonus_chest());
}

#[test]
fn test_task_progress_clamps_and_sticks() {
    let mut sim = new_sim();
    let state = sim.store.state_mut();
    sim.ctx.increment_task(state, "letter_read", 5);
    let task = state
        .live_ops
        .daily_tasks
        .iter()
        .find(|task| task.id == "letter_read")
        .unwrap();
    assert_eq!(task.progress, 1);
    assert!(task.complete);
}

#[test]
fn test_echo_expiry_reverts_item_in_place() {
    let mut sim = new_sim();
    let uid = {
        let state = sim.store.state_mut();
        sim.ctx
            .spawn_item(
                state,
                "wood_6",
                ContainerKind::Board,
                4,
                None,
                true,
                Some(NOW + 1_000),
            )
            .unwrap()
            .uid
    };
    assert_eq!(sim.state().echo.active_echo_ids, vec![uid.clone()]);

    sim.tick(NOW + 2_000).unwrap();

    let state = sim.state();
    let item = &state.items[&uid];
    assert!(!item.is_echo);
    assert!(item.echo_expires_at.is_none());
    assert_eq!(item.slot_index, 4);
    assert!(state.echo.active_echo_ids.is_empty());
}

#[test]
fn test_echo_warning_stages_advance() {
    let mut sim = new_sim();
    let uid = {
        let state = sim.store.state_mut();
        sim.ctx
            .spawn_item(
                state,
                "wood_6",
                ContainerKind::Board,
                0,
                None,
                true,
                Some(NOW + 7 * 60 * 60 * 1000),
            )
            .unwrap()
            .uid
    };

    // Inside the six-hour window
    sim.tick(NOW + 2 * 60 * 60 * 1000).unwrap();
    assert_eq!(
        sim.state().items[&uid].echo_warning_stage,
        Some(merge_manor_types::EchoWarningStage::SixHours)
    );

    // Inside the final ten minutes
    sim.tick(NOW + 7 * 60 * 60 * 1000 - 5 * 60 * 1000).unwrap();
    assert_eq!(
        sim.state().items[&uid].echo_warning_stage,
        Some(merge_manor_types::EchoWarningStage::TenMinutes)
    );
}

#[test]
fn test_pity_counter_forces_echo() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        state.player.level = 5;
        state.echo.eligible_merge_miss_count = state.config.echo.pity_threshold;
    }
    let a = spawn_board(&mut sim, "wood_5", 0);
    spawn_board(&mut sim, "wood_5", 1);

    let (x, y) = board_center(1);
    assert_eq!(sim.drop_item(&a, x, y).unwrap(), DropOutcome::Merged);

    let state = sim.state();
    assert_eq!(state.echo.active_echo_ids.len(), 1);
    assert_eq!(state.echo.eligible_merge_miss_count, 0);
    let echo = &state.items[&state.echo.active_echo_ids[0]];
    assert!(echo.is_echo);
    assert_eq!(echo.item_id, "wood_6");
    assert!(echo.echo_expires_at.is_some());
}

#[test]
fn test_echo_overflow_drops_silently_with_notice() {
    let mut sim = new_sim();
    // Fill the entire board and inventory with terminal items
    for slot in 0..merge_manor_types::BOARD_SLOT_COUNT {
        spawn_board(&mut sim, "wood_8", slot);
    }
    let capacity = sim.state().inventory_capacity;
    for slot in 0..capacity {
        spawn_inventory(&mut sim, "wood_8", slot);
    }
    {
        let state = sim.store.state_mut();
        // One eligible source item and a saturated pending queue
        state.items.values_mut().next().unwrap().tier = 6;
        let max = state.config.echo.pending_queue_max;
        state.echo.pending_echo_item_ids = vec!["wood_6".to_string(); max];
    }

    let triggered = sim.force_echo_on_random_eligible().unwrap();
    assert!(!triggered);
    assert!(sim.state().pending_inbox_notice.is_some());

    sim.dismiss_inbox_notice();
    assert!(sim.state().pending_inbox_notice.is_none());
}

#[test]
fn test_echo_zone_opens_branch_choice() {
    let mut sim = new_sim();
    let uid = {
        let state = sim.store.state_mut();
        sim.ctx
            .spawn_item(
                state,
                "wood_6",
                ContainerKind::Board,
                0,
                None,
                true,
                Some(NOW + DAY_MS),
            )
            .unwrap()
            .uid
    };

    let (x, y) = ECHO_SLOT_RECT.center();
    let outcome = sim.drop_item(&uid, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::EchoSlot);
    assert!(sim.is_echo_choice_open());
    assert!(sim.state().ui.show_decor_modal);
    let branch = sim.current_branch_moment().unwrap().unwrap();
    assert_eq!(branch.id, "kitchen_modern_vintage");
}

#[test]
fn test_echo_zone_rejects_normal_items() {
    let mut sim = new_sim();
    let uid = spawn_board(&mut sim, "wood_6", 0);
    let (x, y) = ECHO_SLOT_RECT.center();
    // A non-echo item falls through zone handling; the zone rects sit
    // outside the grids so the drop resolves to nothing
    let outcome = sim.drop_item(&uid, x, y).unwrap();
    assert_eq!(outcome, DropOutcome::Invalid);
    assert!(!sim.is_echo_choice_open());
}

#[test]
fn test_echo_choice_grants_rewards_and_letter() {
    let mut sim = new_sim();
    let uid = {
        let state = sim.store.state_mut();
        sim.ctx
            .spawn_item(
                state,
                "wood_6",
                ContainerKind::Board,
                0,
                None,
                true,
                Some(NOW + DAY_MS),
            )
            .unwrap()
            .uid
    };
    let (x, y) = ECHO_SLOT_RECT.center();
    sim.drop_item(&uid, x, y).unwrap();

    assert!(sim.choose_echo_option(EchoOption::B, false).unwrap());

    let state = sim.state();
    assert!(state.items.is_empty());
    assert!(state.echo.choice_state.is_none());
    assert_eq!(state.player.stars, 90);
    assert_eq!(state.decor.flags.get("kitchen_vintage_chosen"), Some(&true));
    assert_eq!(
        state.decor.room_styles.get("kitchen").map(String::as_str),
        Some("kitchen_vintage")
    );
    assert!(state.letters.iter().any(|letter| letter.id == "kitchen_vintage_letter"));
    assert_eq!(state.decor.current_room_id, "kitchen");
}

#[test]
fn test_letter_delivery_is_idempotent() {
    let mut sim = new_sim();
    let state = sim.store.state_mut();
    sim.ctx.add_letter_by_id(state, "curator_hint").unwrap();
    sim.ctx.add_letter_by_id(state, "curator_hint").unwrap();
    assert_eq!(
        state
            .letters
            .iter()
            .filter(|letter| letter.id == "curator_hint")
            .count(),
        1
    );
}

#[test]
fn test_letter_body_placeholders_filled() {
    let mut sim = new_sim();
    let state = sim.store.state_mut();
    sim.ctx.add_letter_by_id(state, "hall_first_order").unwrap();
    let letter = &state.letters[0];
    assert!(letter.body.contains("Caretaker"));
    assert!(letter.body.contains("Entrance Hall"));
    assert!(!letter.body.contains("{player_name}"));
}

#[test]
fn test_read_letter_marks_once_and_tracks() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        sim.ctx.add_letter_by_id(state, "curator_hint").unwrap();
    }
    sim.read_letter("curator_hint");
    let first_read_at = sim.state().letters[0].read_at;
    assert!(first_read_at.is_some());

    sim.read_letter("curator_hint");
    assert_eq!(sim.state().letters[0].read_at, first_read_at);

    let task = sim
        .state()
        .live_ops
        .daily_tasks
        .iter()
        .find(|task| task.id == "letter_read")
        .unwrap();
    assert!(task.complete);
}

#[test]
fn test_choice_grace_period_auto_resolves_option_a() {
    let mut sim = new_sim();
    let uid = {
        let state = sim.store.state_mut();
        sim.ctx
            .spawn_item(
                state,
                "wood_6",
                ContainerKind::Board,
                0,
                None,
                true,
                Some(NOW + 1_000),
            )
            .unwrap()
            .uid
    };
    let (x, y) = ECHO_SLOT_RECT.center();
    sim.drop_item(&uid, x, y).unwrap();

    // Echo expires while the choice modal is open; a grace window starts
    sim.tick(NOW + 2_000).unwrap();
    let grace = sim
        .state()
        .echo
        .choice_state
        .as_ref()
        .unwrap()
        .grace_deadline_at;
    assert!(grace.is_some());

    // Past the deadline the choice resolves itself with option A
    sim.tick(grace.unwrap() + 1).unwrap();
    let state = sim.state();
    assert!(state.echo.choice_state.is_none());
    assert_eq!(state.player.stars, 90);
    assert_eq!(state.decor.flags.get("kitchen_modern_chosen"), Some(&true));
}

#[test]
fn test_inventory_expiry_converts_to_coins() {
    let mut sim = new_sim();
    spawn_inventory(&mut sim, "wood_3", 0);
    let coins_before = sim.state().player.coins;

    let expiry_ms = sim.state().config.inventory.expiry_hours * 3600 * 1000;
    sim.tick(NOW + expiry_ms + 1).unwrap();

    // Half of tier 3's sell value of 8
    assert_eq!(sim.state().player.coins, coins_before + 4);
    assert!(sim.state().items.is_empty());
}

#[test]
fn test_merge_streak_resets_when_idle() {
    let mut sim = new_sim();
    let a = spawn_board(&mut sim, "wood_1", 0);
    spawn_board(&mut sim, "wood_1", 1);
    let (x, y) = board_center(1);
    sim.drop_item(&a, x, y).unwrap();
    assert_eq!(sim.state().echo.consecutive_merge_count, 1);

    sim.tick(NOW + 8_000).unwrap();
    assert_eq!(sim.state().echo.consecutive_merge_count, 0);
}

#[test]
fn test_watch_energy_ad_requires_low_energy() {
    let mut deps = SimulationDeps::simulated(7);
    deps.ads = Box::new(AlwaysFillAds);
    let mut sim = GameSimulation::new(deps, NOW).unwrap();

    assert!(!sim.watch_energy_ad());

    sim.store.state_mut().energy.current = 5;
    assert!(sim.watch_energy_ad());
    assert_eq!(sim.state().energy.current, 20);
    assert_eq!(sim.state().energy.rv_watches_today, 1);
}

#[test]
fn test_purchase_grants_catalog_rewards() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        state.energy.current = 10;
    }
    let coins_before = sim.state().player.coins;

    assert!(sim.purchase_sku("starter_pack"));
    let state = sim.state();
    assert_eq!(state.player.coins, coins_before + 500);
    assert_eq!(state.player.gems, 30 + 50);
    assert_eq!(state.energy.current, 40);
    assert_eq!(state.purchase_history.len(), 1);

    assert!(!sim.purchase_sku("mystery_box"));
    assert_eq!(sim.state().purchase_history.len(), 1);
}

#[test]
fn test_mini_mode_energy_gate() {
    let mut sim = new_sim();
    let cost = sim.state().config.energy.mini_mode_entry_cost;
    let before = sim.state().energy.current;
    assert!(sim.consume_mini_mode_energy());
    assert_eq!(sim.state().energy.current, before - cost);

    sim.store.state_mut().energy.current = cost - 1;
    assert!(!sim.consume_mini_mode_energy());
}

#[test]
fn test_auto_merge_by_double_tap() {
    let mut sim = new_sim();
    for slot in 0..4 {
        spawn_board(&mut sim, "wood_1", slot);
    }

    assert!(sim.auto_merge_by_double_tap("wood_1").unwrap());
    assert_eq!(sim.state().items.len(), 1);
    assert_eq!(sim.state().items.values().next().unwrap().item_id, "wood_3");

    // Cooldown blocks an immediate second tap
    assert!(!sim.auto_merge_by_double_tap("wood_1").unwrap());
}

#[test]
fn test_expand_inventory_clamps_at_max() {
    let mut sim = new_sim();
    let base = sim.state().config.inventory.base_slots;
    let max = sim.state().config.inventory.max_slots;

    assert!(sim.expand_inventory_by(10));
    assert_eq!(sim.state().inventory_capacity, base + 10);
    assert_eq!(sim.state().inventory_slots.len(), base + 10);

    assert!(sim.expand_inventory_by(1000));
    assert_eq!(sim.state().inventory_capacity, max);
    assert!(!sim.expand_inventory_by(1));
}

#[test]
fn test_save_restore_roundtrip() {
    let store = SharedStore::default();
    let mut sim = GameSimulation::new(deps_with(store.clone()), NOW).unwrap();
    let a = spawn_board(&mut sim, "wood_1", 0);
    spawn_board(&mut sim, "wood_1", 1);
    let (x, y) = board_center(1);
    sim.drop_item(&a, x, y).unwrap();
    sim.debug_give_resources(100, 10, 0);
    sim.save_now();

    let snapshot_items: Vec<_> = sim.state().items.values().cloned().collect();
    let coins = sim.state().player.coins;

    let resumed = GameSimulation::new(deps_with(store), NOW + 1_000).unwrap();
    let restored_items: Vec<_> = resumed.state().items.values().cloned().collect();
    assert_eq!(restored_items, snapshot_items);
    assert_eq!(resumed.state().player.coins, coins);
    assert!(resumed.state().check_slot_consistency().is_ok());
}

#[test]
fn test_restored_session_continues_rng_sequence() {
    let store = SharedStore::default();
    let mut sim = GameSimulation::new(deps_with(store.clone()), NOW).unwrap();
    sim.save_now();
    let expected = sim.ctx.rng.next_u32();

    let mut resumed = GameSimulation::new(deps_with(store), NOW + 1_000).unwrap();
    assert_eq!(resumed.ctx.rng.next_u32(), expected);
}

#[test]
fn test_fault_boundary_resets_exactly_once() {
    let store = SharedStore::default();
    let mut sim = GameSimulation::new(deps_with(store), NOW).unwrap();

    // An unknown content id in the pending echo queue faults the tick
    sim.store
        .state_mut()
        .echo
        .pending_echo_item_ids
        .push("phantom_item".to_string());
    sim.tick_guarded(NOW + 16);

    // First fault: everything reset to defaults
    assert!(sim.state().echo.pending_echo_item_ids.is_empty());
    assert!(sim.state().items.is_empty());

    // Second fault: logged but no further reset
    sim.debug_give_resources(1000, 0, 0);
    let coins = sim.state().player.coins;
    sim.store
        .state_mut()
        .echo
        .pending_echo_item_ids
        .push("phantom_item".to_string());
    sim.tick_guarded(NOW + 32);
    assert_eq!(sim.state().player.coins, coins);
}

#[test]
fn test_reset_save_and_state_starts_over() {
    let mut sim = new_sim();
    spawn_board(&mut sim, "wood_1", 0);
    sim.debug_give_resources(1000, 0, 0);
    sim.save_now();

    sim.reset_save_and_state();
    let state = sim.state();
    assert!(state.items.is_empty());
    assert_eq!(state.player.coins, 200);
    assert_eq!(state.orders_active.len(), 3);
}

#[test]
fn test_subscribers_fire_on_commit() {
    let mut sim = new_sim();
    let seen = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&seen);
    sim.subscribe(Box::new(move |_state| {
        *sink.borrow_mut() += 1;
    }));
    assert_eq!(*seen.borrow(), 1);

    sim.debug_give_resources(1, 0, 0);
    assert_eq!(*seen.borrow(), 2);
}

#[test]
fn test_pickup_and_item_rect() {
    let mut sim = new_sim();
    let uid = spawn_board(&mut sim, "wood_1", 5);
    let (x, y) = board_center(5);

    let pickup = sim.pickup_at(x, y).unwrap();
    assert_eq!(pickup.item_id, uid);
    assert_eq!(Some(pickup.rect), sim.item_rect(&uid));
    assert!(sim.pickup_at(0.0, 0.0).is_none());
}

#[test]
fn test_item_tooltip_contents() {
    let mut sim = new_sim();
    let uid = spawn_board(&mut sim, "wood_1", 0);
    let tooltip = sim.item_tooltip(&uid).unwrap().unwrap();
    assert!(tooltip.contains("Twig Bundle (Tier 1)"));
    assert!(tooltip.contains("Next: Rough Plank"));

    let max = spawn_board(&mut sim, "wood_8", 1);
    let tooltip = sim.item_tooltip(&max).unwrap().unwrap();
    assert!(tooltip.contains("Next: MAX"));
}

#[test]
fn test_room_navigation_respects_episode_gate() {
    let mut sim = new_sim();
    sim.set_current_room("library_study");
    // Episode 1 players cannot enter an episode 3 room
    assert_eq!(sim.state().decor.current_room_id, "entrance_hall");

    sim.set_current_room("kitchen");
    assert_eq!(sim.state().decor.current_room_id, "kitchen");
}

#[test]
fn test_level_up_advances_episode_and_unlocks_room() {
    let mut sim = new_sim();
    {
        let state = sim.store.state_mut();
        // 100 + 140 xp crosses into level 3
        sim.ctx.grant_xp(state, 250).unwrap();
    }
    let state = sim.state();
    assert_eq!(state.player.level, 3);
    assert_eq!(state.player.episode, 2);

    sim.set_current_room("sunroom_garden");
    assert_eq!(sim.state().decor.current_room_id, "sunroom_garden");
}

#[test]
fn test_episode_steps_advance_in_order() {
    let mut sim = new_sim();
    assert_eq!(sim.state().episode_active_step_id.as_deref(), Some("ep1_spawn"));

    sim.try_generator_spawn("toolbox").unwrap();
    assert_eq!(sim.state().episode_active_step_id.as_deref(), Some("ep1_merge"));
    assert_eq!(sim.state().episode_completed_steps, vec!["ep1_spawn".to_string()]);

    let a = spawn_board(&mut sim, "wood_1", 10);
    spawn_board(&mut sim, "wood_1", 11);
    let (x, y) = board_center(11);
    sim.drop_item(&a, x, y).unwrap();
    assert_eq!(sim.state().episode_active_step_id.as_deref(), Some("ep1_order"));
}

#[test]
fn test_toasts_trim_after_lifetime() {
    let mut sim = new_sim();
    sim.debug_give_resources(1, 0, 0);
    assert!(!sim.state().ui.toasts.is_empty());

    sim.tick(NOW + 10_000).unwrap();
    assert!(sim.state().ui.toasts.is_empty());
}

#[test]
fn test_inventory_paging_bounds() {
    let mut sim = new_sim();
    assert_eq!(sim.state().ui.inventory_page, 0);
    sim.next_inventory_page(-1);
    assert_eq!(sim.state().ui.inventory_page, 0);
    sim.next_inventory_page(1);
    assert_eq!(sim.state().ui.inventory_page, 1);
    // Base capacity of 30 has exactly two pages
    sim.next_inventory_page(1);
    assert_eq!(sim.state().ui.inventory_page, 1);
}
