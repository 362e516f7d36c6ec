//! Order lifecycle: selection, queueing, completion and reroll
//!
//! Three active slots are always filled, backed by a two-deep queue.
//! Completion is all-or-nothing: a reservation pass picks the cheapest
//! matching items (ascending tier, board preferred on ties) and either
//! covers every requirement or consumes nothing.

use merge_manor_types::{ACTIVE_ORDER_SLOTS, ORDER_QUEUE_DEPTH};
use serde_json::json;

use crate::content::{ContentError, OrderRequirementDef};
use crate::state::{GameState, OrderInstance};

use super::{GameSimulation, SimCtx, SimulationError};

impl GameSimulation {
    /// Reroll an active order: free once per day, then for escalating gems
    pub fn reroll_order(&mut self, slot_index: usize) -> Result<bool, SimulationError> {
        let state = self.store.state_mut();
        if slot_index >= state.orders_active.len() {
            return Ok(false);
        }

        let today = crate::clock::day_key(state.now);
        if state.reroll.day_key != today {
            state.reroll.day_key = today;
            state.reroll.free_used = false;
            state.reroll.gem_cost = 10;
        }

        if !state.reroll.free_used {
            state.reroll.free_used = true;
        } else {
            if state.player.gems < state.reroll.gem_cost {
                self.ctx.toast(state, "Not enough gems");
                self.store.publish();
                return Ok(false);
            }
            state.player.gems -= state.reroll.gem_cost;
            state.reroll.gem_cost = (state.reroll.gem_cost + 5).clamp(10, 50);
        }

        let easy_slot = slot_index == 0 && state.player.level < 10;
        self.ctx.replace_order_at(state, slot_index, easy_slot)?;
        self.ctx.record_action(state, "use_reroll");
        self.ctx.toast(state, "Order rerolled");
        self.store.publish();
        Ok(true)
    }

    /// Complete the order in a slot if every requirement can be reserved
    pub fn try_complete_order(&mut self, slot_index: usize) -> Result<bool, SimulationError> {
        let state = self.store.state_mut();
        let completed = self.ctx.complete_order_at(state, slot_index)?;
        if completed {
            debug_assert!(state.check_slot_consistency().is_ok());
        }
        self.store.publish();
        Ok(completed)
    }
}

impl SimCtx {
    /// Inner completion flow shared by the tap path and the drag path
    pub(crate) fn complete_order_at(
        &mut self,
        state: &mut GameState,
        slot_index: usize,
    ) -> Result<bool, ContentError> {
        let Some(order) = state.orders_active.get(slot_index).cloned() else {
            return Ok(false);
        };
        let definition = self.content.order(&order.definition_id)?.clone();

        let Some(consumed) = collect_items_for_requirements(state, &definition.requirements)
        else {
            self.toast(state, "Missing required items");
            return Ok(false);
        };

        for uid in &consumed {
            self.delete_item(state, uid);
        }

        state.player.coins += u64::from(definition.rewards.coins);
        state.player.stars += definition.rewards.stars;
        self.grant_xp(state, definition.rewards.xp)?;

        let now = state.now;
        self.analytics.track(
            "order_completed",
            now,
            json!({
                "order_id": definition.id,
                "order_type": format!("{:?}", definition.order_type),
            }),
        );
        self.increment_task(state, "order_completed", 1);
        self.record_action(state, "complete_first_order");

        if let Some(letter_id) = definition.trigger_letter_id {
            self.add_letter_by_id(state, letter_id)?;
        }
        if let Some(branch_id) = definition.trigger_branch_moment_id {
            state
                .echo
                .pending_branch_moment_ids
                .push(branch_id.to_string());
        }

        let easy_slot = slot_index == 0 && state.player.level < 10;
        self.replace_order_at(state, slot_index, easy_slot)?;
        self.fill_order_queue(state);

        self.toast(
            state,
            format!(
                "Order complete +{}c +{}s",
                definition.rewards.coins, definition.rewards.stars
            ),
        );
        Ok(true)
    }

    /// Drag-onto-order path: the first active order whose requirements the
    /// dragged item could contribute to is attempted in full.
    pub(crate) fn try_complete_order_by_dragged_item(
        &mut self,
        state: &mut GameState,
        uid: &str,
    ) -> Result<bool, ContentError> {
        let Some(item) = state.items.get(uid).cloned() else {
            return Ok(false);
        };

        for index in 0..state.orders_active.len() {
            let definition_id = state.orders_active[index].definition_id.clone();
            let definition = self.content.order(&definition_id)?;
            let contributes = definition
                .requirements
                .iter()
                .any(|req| req.chain == item.chain && item.tier >= req.tier);
            if contributes {
                return self.complete_order_at(state, index);
            }
        }
        Ok(false)
    }

    /// Seed the fresh-state order board: one easy order up front, then
    /// level-appropriate fills
    pub(crate) fn seed_initial_orders(&mut self, state: &mut GameState) {
        state.orders_active.clear();
        state.orders_queued.clear();
        for index in 0..ACTIVE_ORDER_SLOTS {
            let order = self.make_order_instance(state, index == 0);
            state.orders_active.push(order);
        }
        for _ in 0..ORDER_QUEUE_DEPTH {
            let order = self.make_order_instance(state, false);
            state.orders_queued.push(order);
        }
    }

    /// Top the queue back up to depth and keep all active slots filled
    pub(crate) fn fill_order_queue(&mut self, state: &mut GameState) {
        while state.orders_queued.len() < ORDER_QUEUE_DEPTH {
            let order = self.make_order_instance(state, false);
            state.orders_queued.push(order);
        }
        while state.orders_active.len() < ACTIVE_ORDER_SLOTS {
            let order = if state.orders_queued.is_empty() {
                self.make_order_instance(state, false)
            } else {
                state.orders_queued.remove(0)
            };
            state.orders_active.push(order);
        }
    }

    /// Replace one active slot from the queue. While the player is below
    /// level 10, slot 0 is re-drawn until it carries no tier>3 requirement.
    pub(crate) fn replace_order_at(
        &mut self,
        state: &mut GameState,
        index: usize,
        easy_slot: bool,
    ) -> Result<(), ContentError> {
        let replacement = if state.orders_queued.is_empty() {
            self.make_order_instance(state, easy_slot)
        } else {
            state.orders_queued.remove(0)
        };
        state.orders_active[index] = replacement;

        if easy_slot && state.player.level < 10 {
            let definition_id = state.orders_active[index].definition_id.clone();
            let definition = self.content.order(&definition_id)?;
            if !definition.is_easy() {
                state.orders_active[index] = self.make_order_instance(state, true);
            }
        }
        Ok(())
    }

    /// Draw an order definition filtered by level window (and the easy
    /// constraint), avoiding ids already on the board when the pool allows
    pub(crate) fn make_order_instance(
        &mut self,
        state: &mut GameState,
        easy_only: bool,
    ) -> OrderInstance {
        let used_ids: Vec<&str> = state
            .orders_active
            .iter()
            .chain(state.orders_queued.iter())
            .map(|order| order.definition_id.as_str())
            .collect();

        let pool_size = self.content.orders().len();
        let candidates: Vec<usize> = self
            .content
            .orders()
            .iter()
            .enumerate()
            .filter(|(_, order)| {
                if order.min_player_level > state.player.level
                    || order.max_player_level < state.player.level
                {
                    return false;
                }
                if easy_only && !order.is_easy() {
                    return false;
                }
                if used_ids.contains(&order.id) && pool_size > 5 {
                    return false;
                }
                true
            })
            .map(|(index, _)| index)
            .collect();

        let picked = if candidates.is_empty() {
            0
        } else {
            let draw = self.rng.int(0, candidates.len() as i64 - 1) as usize;
            candidates[draw]
        };
        let selected = &self.content.orders()[picked];

        OrderInstance {
            instance_id: self.ids.make("order"),
            definition_id: selected.id.to_string(),
            order_type: selected.order_type,
            created_at: state.now,
            expires_at: selected
                .timed_seconds
                .map(|seconds| state.now + seconds * 1000),
            forced_at: state.now,
        }
    }
}

/// Reserve just enough non-echo items to cover every requirement.
/// Candidates are considered ascending by tier, board container first on
/// ties, so cheap items are spent before valuable ones. Returns `None`
/// (and reserves nothing) when any requirement cannot be covered.
fn collect_items_for_requirements(
    state: &GameState,
    requirements: &[OrderRequirementDef],
) -> Option<Vec<String>> {
    let mut candidates: Vec<_> = state
        .items
        .values()
        .filter(|item| !item.is_echo)
        .collect();
    candidates.sort_by_key(|item| {
        (
            item.tier,
            item.container == merge_manor_types::ContainerKind::Inventory,
        )
    });

    let mut reserved: Vec<String> = Vec::new();
    for requirement in requirements {
        let mut matched = 0;
        for item in &candidates {
            if reserved.iter().any(|uid| uid == &item.uid) {
                continue;
            }
            if item.chain != requirement.chain || item.tier < requirement.tier {
                continue;
            }
            reserved.push(item.uid.clone());
            matched += 1;
            if matched >= requirement.count {
                break;
            }
        }
        if matched < requirement.count {
            return None;
        }
    }

    Some(reserved)
}
