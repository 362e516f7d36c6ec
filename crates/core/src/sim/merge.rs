//! Merging and chain-reaction resolution
//!
//! A merge consumes two equal non-echo items below the terminal tier and
//! produces the next tier at the target slot. After any merge the affected
//! container is rescanned for same-type groups; groups resolve highest
//! tier first so cascades climb upward deterministically instead of
//! left-to-right.

use std::collections::BTreeMap;

use merge_manor_types::{
    ContainerKind, DOUBLE_TAP_MERGE_COOLDOWN_MS, MAX_TIER, MERGE_STREAK_RESET_MS,
};
use serde_json::json;

use crate::content::ContentError;
use crate::state::{GameState, ItemInstance};

use super::{GameSimulation, SimCtx, SimulationError};

/// A same-type group eligible for pair merging
struct MergeGroup {
    tier: u8,
    ids: Vec<String>,
}

impl SimCtx {
    pub(crate) fn can_items_merge(&self, a: &ItemInstance, b: &ItemInstance) -> bool {
        !a.is_echo
            && !b.is_echo
            && a.item_id == b.item_id
            && a.tier < MAX_TIER
            && b.tier < MAX_TIER
    }

    /// Merge two items into the next tier at the target slot. Returns
    /// `Ok(false)` when the pair is not mergeable.
    pub(crate) fn merge_items(
        &mut self,
        state: &mut GameState,
        a_uid: &str,
        b_uid: &str,
        target_container: ContainerKind,
        target_slot: usize,
    ) -> Result<bool, ContentError> {
        let (Some(item_a), Some(item_b)) = (
            state.items.get(a_uid).cloned(),
            state.items.get(b_uid).cloned(),
        ) else {
            return Ok(false);
        };
        if !self.can_items_merge(&item_a, &item_b) {
            return Ok(false);
        }

        let Some(next_id) = self.content.next_tier_item(&item_a.item_id)? else {
            self.toast(state, "Already at max tier");
            return Ok(false);
        };

        self.delete_item(state, a_uid);
        self.delete_item(state, b_uid);

        let source = item_a
            .source_generator_id
            .clone()
            .or(item_b.source_generator_id.clone());
        let merged =
            self.spawn_item(state, next_id, target_container, target_slot, source, false, None)?;

        let now = state.now;
        self.analytics.track(
            "merge_completed",
            now,
            json!({
                "from_item": item_a.item_id,
                "to_item": next_id,
                "tier": merged.tier,
            }),
        );
        self.increment_task(state, "merge_completed", 1);

        // Streak continues only while merges land inside the reset window
        if now.saturating_sub(self.last_merge_at) > MERGE_STREAK_RESET_MS {
            state.echo.consecutive_merge_count = 1;
        } else {
            state.echo.consecutive_merge_count += 1;
        }
        self.last_merge_at = now;

        self.record_action(state, "first_merge");
        if (5..=7).contains(&merged.tier) {
            self.try_echo_roll_from_merged_item(state, &merged)?;
        }

        let name = self.content.item(&merged.item_id)?.name;
        self.toast(state, format!("{name} merged"));
        log::debug!("merged {} + {} -> {}", item_a.item_id, item_b.item_id, next_id);
        Ok(true)
    }

    /// Repeatedly merge pairs within same-type groups, highest tier first,
    /// rescanning after every merge until a full scan finds nothing.
    /// Terminates because every merge strictly reduces the item count.
    pub(crate) fn resolve_chain_reaction(
        &mut self,
        state: &mut GameState,
        container: ContainerKind,
    ) -> Result<(), ContentError> {
        loop {
            let groups = self.group_mergeable_by_tier_desc(state, container)?;
            let mut merged_in_pass = false;

            'groups: for group in groups {
                let mut ids = group.ids;
                while ids.len() >= 2 {
                    let first = ids.remove(0);
                    let second = ids.remove(0);
                    let Some(first_item) = state.items.get(&first).cloned() else {
                        continue;
                    };
                    if self.merge_items(
                        state,
                        &first,
                        &second,
                        first_item.container,
                        first_item.slot_index,
                    )? {
                        merged_in_pass = true;
                        break 'groups;
                    }
                }
            }

            if !merged_in_pass {
                return Ok(());
            }
        }
    }

    /// Mergeable item uids grouped by content id, in slot order
    pub(crate) fn group_mergeable_by_item(
        &self,
        state: &GameState,
        container: ContainerKind,
    ) -> BTreeMap<String, Vec<String>> {
        let slots = match container {
            ContainerKind::Board => &state.board_slots,
            ContainerKind::Inventory => &state.inventory_slots,
        };
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in slots.iter().flatten() {
            let Some(item) = state.items.get(entry) else {
                continue;
            };
            if item.is_echo || item.tier >= MAX_TIER {
                continue;
            }
            groups
                .entry(item.item_id.clone())
                .or_default()
                .push(item.uid.clone());
        }
        groups
    }

    fn group_mergeable_by_tier_desc(
        &self,
        state: &GameState,
        container: ContainerKind,
    ) -> Result<Vec<MergeGroup>, ContentError> {
        let mut groups = Vec::new();
        for (item_id, ids) in self.group_mergeable_by_item(state, container) {
            if ids.len() < 2 {
                continue;
            }
            let tier = self.content.item(&item_id)?.tier;
            groups.push(MergeGroup { tier, ids });
        }
        groups.sort_by(|a, b| b.tier.cmp(&a.tier));
        Ok(groups)
    }
}

impl GameSimulation {
    /// Double-tap convenience: merge every board pair of the given content
    /// item type, chain reactions included, behind a short per-type
    /// cooldown. Blocked while an echo choice is open.
    pub fn auto_merge_by_double_tap(
        &mut self,
        item_type_id: &str,
    ) -> Result<bool, SimulationError> {
        let state = self.store.state_mut();
        if state.echo.choice_state.is_some() {
            return Ok(false);
        }

        let now = state.now;
        let blocked_until = self
            .ctx
            .double_tap_cooldowns
            .get(item_type_id)
            .copied()
            .unwrap_or(0);
        if blocked_until > now {
            return Ok(false);
        }

        let mut merged_any = false;
        loop {
            let groups = self.ctx.group_mergeable_by_item(state, ContainerKind::Board);
            let Some(ids) = groups.get(item_type_id) else {
                break;
            };
            if ids.len() < 2 {
                break;
            }
            let first = ids[0].clone();
            let second = ids[1].clone();
            let slot = state.items[&first].slot_index;
            if !self
                .ctx
                .merge_items(state, &first, &second, ContainerKind::Board, slot)?
            {
                break;
            }
            merged_any = true;
            self.ctx
                .resolve_chain_reaction(state, ContainerKind::Board)?;
        }

        if merged_any {
            self.ctx.double_tap_cooldowns.insert(
                item_type_id.to_string(),
                now + DOUBLE_TAP_MERGE_COOLDOWN_MS,
            );
            self.store.publish();
        }
        Ok(merged_any)
    }
}
