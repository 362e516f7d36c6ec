//! Echo lifecycle: trigger rolls, placement, and branch-choice resolution
//!
//! Echoes are time-limited variants rolled from tier 5-7 merge results.
//! Placement tries the board, then the inventory, then a bounded pending
//! queue; with everything full the echo is lost and only an inbox notice
//! remains. That lossy overflow is intentional product behavior, kept
//! exactly as shipped.

use merge_manor_types::{sell_value, ContainerKind, EchoOption, NEW_ROOM_ECHO_BONUS_MS};
use serde_json::json;

use crate::content::ContentError;
use crate::state::{ChoiceState, GameState, ItemInstance};

use super::{GameSimulation, SimCtx, SimulationError};

impl GameSimulation {
    /// Resolve the open branch choice. `forced_auto` marks grace-period
    /// timeouts; the outcome is identical, only telemetry differs.
    pub fn choose_echo_option(
        &mut self,
        option: EchoOption,
        forced_auto: bool,
    ) -> Result<bool, SimulationError> {
        let state = self.store.state_mut();
        let resolved = self.ctx.resolve_echo_choice(state, option, forced_auto)?;
        if resolved {
            self.store.publish();
        }
        Ok(resolved)
    }

    /// Cash out an echo early for half its sell value
    pub fn convert_echo_to_coins(&mut self, uid: &str) -> bool {
        let state = self.store.state_mut();
        let Some(item) = state.items.get(uid) else {
            return false;
        };
        if !item.is_echo {
            return false;
        }

        let reward = u64::from(sell_value(item.tier)) / 2;
        state.player.coins += reward;
        self.ctx.delete_item(state, uid);
        self.ctx.toast(state, format!("Echo converted +{reward} coins"));
        self.store.publish();
        true
    }

    /// Debug helper: force an echo from the first eligible item
    pub fn force_echo_on_random_eligible(&mut self) -> Result<bool, SimulationError> {
        let state = self.store.state_mut();
        let candidate = state
            .items
            .values()
            .find(|item| !item.is_echo && (5..=7).contains(&item.tier))
            .map(|item| item.item_id.clone());
        let Some(item_id) = candidate else {
            return Ok(false);
        };
        let triggered = self.ctx.trigger_echo_from_item(state, &item_id)?;
        self.store.publish();
        Ok(triggered)
    }

    /// Open a branch choice from any echo item currently in play
    pub fn open_choice_from_pending_echo(&mut self) -> bool {
        let state = self.store.state_mut();
        let echo_uid = state
            .items
            .values()
            .find(|item| item.is_echo)
            .map(|item| item.uid.clone());
        let Some(uid) = echo_uid else {
            return false;
        };
        if self.ctx.open_echo_choice_for_item(state, &uid) {
            self.store.publish();
            return true;
        }
        false
    }
}

impl SimCtx {
    /// Post-merge echo roll. Chance stacks the base (or early-game) rate
    /// with a new-room bonus, a capped streak bonus and event/VIP boosts;
    /// the pity counter forces a success once the miss streak hits the
    /// threshold and resets on any success.
    pub(crate) fn try_echo_roll_from_merged_item(
        &mut self,
        state: &mut GameState,
        merged: &ItemInstance,
    ) -> Result<(), ContentError> {
        let eligible = (5..=7).contains(&merged.tier)
            && !merged.is_echo
            && state.player.level >= 5
            && state.echo.active_echo_ids.len() < state.config.echo.max_active_echoes;
        if !eligible {
            return Ok(());
        }

        let echo = &state.config.echo;
        let mut chance = if state.player.level <= echo.early_game_level_cap {
            echo.early_game_chance
        } else {
            echo.base_chance
        };

        if state.now.saturating_sub(state.decor.new_room_entered_at) <= NEW_ROOM_ECHO_BONUS_MS {
            chance += echo.new_room_boost;
        }

        let streak_bonus = (f64::from(state.echo.consecutive_merge_count / 5)
            * echo.streak_per_five_merges)
            .min(echo.streak_max_bonus);
        chance += streak_bonus;

        if state.config.features.event_boost_enabled {
            chance += echo.event_boost;
        }
        if state.config.features.vip_bonus_enabled {
            chance += echo.vip_boost;
        }

        let pity = state.echo.eligible_merge_miss_count >= state.config.echo.pity_threshold;
        let success = pity || self.rng.next_f64() <= chance;

        if !success {
            state.echo.eligible_merge_miss_count += 1;
            return Ok(());
        }

        state.echo.eligible_merge_miss_count = 0;
        let triggered = self.trigger_echo_from_item(state, &merged.item_id)?;
        if triggered {
            let now = state.now;
            self.analytics.track(
                "echo_triggered",
                now,
                json!({
                    "base_item": merged.item_id,
                    "tier": merged.tier,
                    "chance": chance,
                    "pity": pity,
                }),
            );
            self.record_action(state, "trigger_first_echo");
        }
        Ok(())
    }

    /// Materialize an echo of the given content item: board first, then
    /// inventory, then the pending queue. With all three full the echo is
    /// dropped and a persistent inbox notice is left behind.
    pub(crate) fn trigger_echo_from_item(
        &mut self,
        state: &mut GameState,
        item_id: &str,
    ) -> Result<bool, ContentError> {
        if state.echo.active_echo_ids.len() >= state.config.echo.max_active_echoes {
            return Ok(false);
        }

        let expires = state.now + state.config.echo.echo_lifetime_hours * 3600 * 1000;

        if let Some(slot) = state.find_first_empty_board_slot() {
            self.spawn_item(state, item_id, ContainerKind::Board, slot, None, true, Some(expires))?;
            self.toast(state, "Time Echo emerged!");
            return Ok(true);
        }

        if let Some(slot) = state.find_first_empty_inventory_slot() {
            self.spawn_item(
                state,
                item_id,
                ContainerKind::Inventory,
                slot,
                None,
                true,
                Some(expires),
            )?;
            self.toast(state, "Time Echo stored in inventory");
            return Ok(true);
        }

        if state.echo.pending_echo_item_ids.len() < state.config.echo.pending_queue_max {
            state.echo.pending_echo_item_ids.push(item_id.to_string());
            self.toast(state, "Time Echo queued (no space)");
            return Ok(true);
        }

        let notice = "Echo fallback notice: no room for additional echoes.";
        state.pending_inbox_notice = Some(notice.to_string());
        self.toast(state, notice);
        Ok(false)
    }

    /// Open the branch choice for an echo item dropped on the echo zone.
    /// Consumes the next queued branch moment, falling back to the first
    /// one in content.
    pub(crate) fn open_echo_choice_for_item(&mut self, state: &mut GameState, uid: &str) -> bool {
        let Some(item) = state.items.get(uid) else {
            return false;
        };
        if !item.is_echo {
            return false;
        }

        let branch_id = if state.echo.pending_branch_moment_ids.is_empty() {
            match self.content.branch_moments().first() {
                Some(branch) => branch.id.to_string(),
                None => return false,
            }
        } else {
            state.echo.pending_branch_moment_ids.remove(0)
        };

        state.echo.choice_state = Some(ChoiceState {
            echo_item_id: uid.to_string(),
            branch_moment_id: branch_id,
            opened_at: state.now,
            grace_deadline_at: None,
        });
        state.ui.show_decor_modal = true;
        true
    }

    /// Apply a branch option: the echo item is consumed, stars granted,
    /// decor flag and room style set, the option's letter delivered
    /// (idempotently) and a fade overlay timer recorded.
    pub(crate) fn resolve_echo_choice(
        &mut self,
        state: &mut GameState,
        option: EchoOption,
        forced_auto: bool,
    ) -> Result<bool, ContentError> {
        let Some(choice) = state.echo.choice_state.clone() else {
            return Ok(false);
        };

        let branch = self.content.branch_moment(&choice.branch_moment_id)?.clone();
        let picked = match option {
            EchoOption::A => branch.option_a.clone(),
            EchoOption::B => branch.option_b.clone(),
        };

        if state.items.contains_key(&choice.echo_item_id) {
            self.delete_item(state, &choice.echo_item_id);
        }

        state.echo.choice_state = None;
        state.ui.show_decor_modal = false;

        let stars_reward = 90;
        state.player.stars += stars_reward;
        state
            .decor
            .flags
            .insert(picked.decor_flag.to_string(), true);
        state.decor.current_room_id = branch.room_id.to_string();
        state.decor.new_room_entered_at = state.now;
        state.ui.overlay_fade_until = state.now + 1200;

        let room = self.content.room(branch.room_id)?;
        let style_id = room
            .styles
            .iter()
            .find(|style| style.id == picked.id)
            .or_else(|| room.styles.first())
            .map(|style| style.id.to_string());
        if let Some(style_id) = style_id {
            state
                .decor
                .room_styles
                .insert(branch.room_id.to_string(), style_id);
        }

        self.add_letter_by_id(state, picked.letter_id)?;

        let now = state.now;
        self.analytics.track(
            "echo_choice_made",
            now,
            json!({
                "branch_id": branch.id,
                "option": match option {
                    EchoOption::A => "A",
                    EchoOption::B => "B",
                },
                "forced_auto": forced_auto,
            }),
        );
        self.record_action(state, "resolve_echo_choice");
        self.toast(
            state,
            format!("{}: +{stars_reward} stars + exclusive letter", picked.title),
        );
        Ok(true)
    }
}
