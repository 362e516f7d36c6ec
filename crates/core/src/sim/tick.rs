//! Per-frame tick - the only path that advances time-driven systems
//!
//! `tick(now)` runs its sub-steps in a fixed order. Each is idempotent for
//! a given `now` and reports whether it touched state; a single commit is
//! published when any did. Timers here are wall-clock deadlines checked on
//! the way through - nothing schedules OS callbacks.

use merge_manor_types::{
    ContainerKind, EchoWarningStage, MERGE_STREAK_RESET_MS, ORDER_FORCE_ROTATE_MS,
    TOAST_LIFETIME_MS,
};

use crate::clock::{day_key, days_between, week_key};
use crate::content::ContentError;
use crate::state::{default_daily_tasks, GameState};

use super::{GameSimulation, SimCtx, SimulationError};

impl GameSimulation {
    /// Advance every time-driven subsystem to `now`. Host loops call this
    /// once per animation frame with a monotonically increasing timestamp.
    pub fn tick(&mut self, now: u64) -> Result<(), SimulationError> {
        let state = self.store.state_mut();
        state.now = now;

        let mut dirty = false;
        dirty |= self.ctx.ensure_periodic_resets(state);
        dirty |= self.ctx.tick_energy_regen(state, now);
        dirty |= self.ctx.tick_order_expiry_and_forcing(state, now)?;
        dirty |= self.ctx.tick_echo_warnings_and_expiry(state, now);
        dirty |= self.ctx.tick_inventory_expiry(state, now);
        dirty |= self.ctx.tick_pending_echo_queue(state)?;
        dirty |= self.ctx.tick_echo_choice_grace(state, now)?;
        dirty |= self.ctx.trim_toasts(state, now);

        if now.saturating_sub(self.ctx.last_merge_at) > MERGE_STREAK_RESET_MS
            && state.echo.consecutive_merge_count != 0
        {
            state.echo.consecutive_merge_count = 0;
            dirty = true;
        }

        if dirty {
            debug_assert!(
                state.check_slot_consistency().is_ok(),
                "slot/item invariant violated during tick"
            );
            self.store.publish();
        }
        Ok(())
    }

    /// Last-resort fault boundary around the frame loop: the first fault
    /// in a session resets save and state, later faults are only logged.
    pub fn tick_guarded(&mut self, now: u64) {
        if let Err(error) = self.tick(now) {
            log::error!("tick fault: {error}");
            if !self.ctx.fault_reset_applied {
                self.ctx.fault_reset_applied = true;
                self.reset_save_and_state();
            }
        }
    }
}

impl SimCtx {
    /// Day/week rollover detection. Resets the reroll allowance, ad
    /// counters, daily tasks, login streak and weekly event points when
    /// their bucket key changes.
    pub(crate) fn ensure_periodic_resets(&mut self, state: &mut GameState) -> bool {
        let mut dirty = false;
        let today = day_key(state.now);

        if state.reroll.day_key != today {
            state.reroll.day_key = today;
            state.reroll.free_used = false;
            state.reroll.gem_cost = 10;
            dirty = true;
        }

        if state.energy.rv_day_key != today {
            state.energy.rv_day_key = today;
            state.energy.rv_watches_today = 0;
            dirty = true;
        }

        if state.live_ops.daily_task_day_key != today {
            state.live_ops.daily_task_day_key = today;
            state.live_ops.daily_tasks = default_daily_tasks();
            state.live_ops.bonus_chest_claimed = false;
            dirty = true;
        }

        if state.live_ops.login_day_key != today {
            // Streak survives only a gap of exactly one day
            if days_between(state.live_ops.login_day_key, today) == 1 {
                state.live_ops.login_streak = (state.live_ops.login_streak + 1).min(7);
            } else {
                state.live_ops.login_streak = 1;
            }
            state.live_ops.login_day_key = today;
            state.live_ops.login_claimed_today = false;
            dirty = true;
        }

        let this_week = week_key(state.now);
        if state.live_ops.weekly_event_week_key != this_week {
            state.live_ops.weekly_event_week_key = this_week;
            state.live_ops.weekly_event_points = 0;
            dirty = true;
        }

        dirty
    }

    /// Integer regen: grant one point per whole interval elapsed and move
    /// `last_tick_at` forward by exactly the intervals consumed, so the
    /// fractional remainder carries into the next tick without drift.
    pub(crate) fn tick_energy_regen(&mut self, state: &mut GameState, now: u64) -> bool {
        if state.energy.current >= state.energy.max {
            state.energy.last_tick_at = now;
            return false;
        }

        let step = state.config.energy.regen_seconds * 1000;
        let elapsed = now.saturating_sub(state.energy.last_tick_at);
        let gained = (elapsed / step) as u32;
        if gained == 0 {
            return false;
        }

        state.energy.current = (state.energy.current + gained).min(state.energy.max);
        state.energy.last_tick_at += u64::from(gained) * step;
        true
    }

    /// Timed orders past their deadline, and any order left unforced for
    /// 24 hours, are replaced; slot 0 stays easy for early players.
    pub(crate) fn tick_order_expiry_and_forcing(
        &mut self,
        state: &mut GameState,
        now: u64,
    ) -> Result<bool, ContentError> {
        let mut dirty = false;
        for index in 0..state.orders_active.len() {
            let order = state.orders_active[index].clone();
            let easy_slot = index == 0 && state.player.level < 10;

            if order.expires_at.is_some_and(|deadline| now >= deadline) {
                self.replace_order_at(state, index, easy_slot)?;
                self.toast(state, "Timed order expired and rerolled");
                dirty = true;
                continue;
            }

            if now.saturating_sub(order.forced_at) >= ORDER_FORCE_ROTATE_MS {
                self.replace_order_at(state, index, easy_slot)?;
                self.toast(state, "Order auto-rerolled after 24h");
                dirty = true;
            }
        }

        if dirty {
            self.fill_order_queue(state);
        }
        Ok(dirty)
    }

    /// Stage warnings as an echo's remaining lifetime shrinks; at zero the
    /// item reverts to a normal item in place.
    pub(crate) fn tick_echo_warnings_and_expiry(
        &mut self,
        state: &mut GameState,
        now: u64,
    ) -> bool {
        let mut dirty = false;

        for uid in state.echo.active_echo_ids.clone() {
            let Some(item) = state.items.get_mut(&uid) else {
                state.echo.active_echo_ids.retain(|id| id != &uid);
                dirty = true;
                continue;
            };
            if !item.is_echo {
                state.echo.active_echo_ids.retain(|id| id != &uid);
                dirty = true;
                continue;
            }
            let expires_at = item.echo_expires_at.unwrap_or(0);
            if now >= expires_at {
                item.is_echo = false;
                item.echo_expires_at = None;
                item.echo_warning_stage = None;
                state.echo.active_echo_ids.retain(|id| id != &uid);
                self.toast(state, "Time Echo expired and became normal");
                dirty = true;
                continue;
            }

            let remaining = expires_at - now;
            let previous = item.echo_warning_stage;
            item.echo_warning_stage = if remaining <= 10 * 60 * 1000 {
                Some(EchoWarningStage::TenMinutes)
            } else if remaining <= 60 * 60 * 1000 {
                Some(EchoWarningStage::OneHour)
            } else if remaining <= 6 * 60 * 60 * 1000 {
                Some(EchoWarningStage::SixHours)
            } else {
                None
            };

            if let Some(stage) = item.echo_warning_stage {
                if previous != Some(stage) {
                    self.toast(state, format!("Echo warning: {} left", stage.as_str()));
                    dirty = true;
                }
            }
        }

        dirty
    }

    /// Inventory items past their expiry convert to half their sell value
    pub(crate) fn tick_inventory_expiry(&mut self, state: &mut GameState, now: u64) -> bool {
        let expired: Vec<(String, u8)> = state
            .items
            .values()
            .filter(|item| {
                item.container == ContainerKind::Inventory
                    && item
                        .inventory_expires_at
                        .is_some_and(|deadline| now >= deadline)
            })
            .map(|item| (item.uid.clone(), item.tier))
            .collect();

        let mut dirty = false;
        for (uid, tier) in expired {
            let sell = u64::from(merge_manor_types::sell_value(tier)) / 2;
            state.player.coins += sell;
            self.delete_item(state, &uid);
            self.toast(state, format!("Expired inventory item converted +{sell} coins"));
            dirty = true;
        }
        dirty
    }

    /// Materialize queued echoes while slots and the active cap allow
    pub(crate) fn tick_pending_echo_queue(
        &mut self,
        state: &mut GameState,
    ) -> Result<bool, ContentError> {
        let mut dirty = false;
        while !state.echo.pending_echo_item_ids.is_empty()
            && state.echo.active_echo_ids.len() < state.config.echo.max_active_echoes
        {
            let target = state
                .find_first_empty_board_slot()
                .map(|slot| (ContainerKind::Board, slot))
                .or_else(|| {
                    state
                        .find_first_empty_inventory_slot()
                        .map(|slot| (ContainerKind::Inventory, slot))
                });
            let Some((container, slot)) = target else {
                break;
            };

            let item_id = state.echo.pending_echo_item_ids.remove(0);
            let expires = state.now + state.config.echo.echo_lifetime_hours * 3600 * 1000;
            self.spawn_item(state, &item_id, container, slot, None, true, Some(expires))?;
            dirty = true;
        }
        Ok(dirty)
    }

    /// If the echo backing an open choice expired, start the grace window;
    /// past the deadline the choice resolves to option A on its own.
    pub(crate) fn tick_echo_choice_grace(
        &mut self,
        state: &mut GameState,
        now: u64,
    ) -> Result<bool, ContentError> {
        let Some(choice) = state.echo.choice_state.clone() else {
            return Ok(false);
        };

        let Some(item) = state.items.get(&choice.echo_item_id) else {
            state.echo.choice_state = None;
            state.ui.show_decor_modal = false;
            return Ok(true);
        };

        let expires_at = item.echo_expires_at.unwrap_or(0);
        if now > expires_at && choice.grace_deadline_at.is_none() {
            let deadline = now + state.config.echo.choice_grace_seconds * 1000;
            if let Some(choice) = &mut state.echo.choice_state {
                choice.grace_deadline_at = Some(deadline);
            }
            self.toast(state, "Echo choice grace period started");
            return Ok(true);
        }

        if choice
            .grace_deadline_at
            .is_some_and(|deadline| now >= deadline)
        {
            self.resolve_echo_choice(state, merge_manor_types::EchoOption::A, true)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Drop toasts older than the display window
    pub(crate) fn trim_toasts(&mut self, state: &mut GameState, now: u64) -> bool {
        let before = state.ui.toasts.len();
        state
            .ui
            .toasts
            .retain(|toast| now.saturating_sub(toast.created_at) <= TOAST_LIFETIME_MS);
        before != state.ui.toasts.len()
    }
}
