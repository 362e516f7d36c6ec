//! Game simulation - owns the authoritative state and every mutation
//!
//! All gameplay flows through [`GameSimulation`]: drag-and-drop, merges,
//! orders, echoes, the economy and the per-frame [`GameSimulation::tick`].
//! Methods mutate the state in place and finish by publishing through the
//! store; subscribers observe committed snapshots only.
//!
//! Internally the logic lives on `SimCtx` (content, RNG, collaborators)
//! as methods taking `&mut GameState`, so the state borrow and the
//! collaborator borrows stay disjoint.

mod echo;
mod merge;
mod orders;
mod progress;
#[cfg(test)]
mod tests;
mod tick;

use std::collections::HashMap;

use merge_manor_types::{
    sell_value, ContainerKind, DropOutcome, InventoryWarningStage, Rect, UiPanel,
    CHOICE_RESUME_CUTOFF_MS, ECHO_SLOT_RECT, INVENTORY_PAGE_SIZE, ORDER_DROP_RECT, TRASH_RECT,
};
use serde_json::json;
use thiserror::Error;

use crate::collab::{
    AdFailure, AdPlacement, AdPolicy, AdProvider, AnalyticsEvent, AnalyticsRecorder,
    ConfirmationPolicy, IdGenerator, PurchaseProvider,
};
use crate::config::ConfigProvider;
use crate::content::{BranchMomentDef, ContentError, ContentRepository, OrderDef};
use crate::layout::{
    board_slot_to_rect, inventory_global_to_visible, inventory_slot_to_rect, nearest_board_slot,
    nearest_inventory_slot, point_to_board_slot, point_to_inventory_slot,
};
use crate::rng::DeterministicRng;
use crate::save::{SaveDataV2, SaveService};
use crate::state::{GameState, GeneratorState, ItemInstance, Toast, UiState};
use crate::store::{Listener, Store, SubscriptionId};

/// Fatal simulation failure. Domain-rule rejections are ordinary return
/// values; an error here means content data and game state disagree.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Item picked up by the pointer, with its source rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct DragPickup {
    pub item_id: String,
    pub rect: Rect,
}

/// Typed rejection reasons for a generator spawn attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejection {
    UnknownGenerator,
    NotEnoughEnergy,
    Cooldown,
    NoSpace,
}

/// Result of [`GameSimulation::try_generator_spawn`]
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnOutcome {
    Spawned { item_id: String },
    Rejected(SpawnRejection),
}

impl SpawnOutcome {
    pub fn ok(&self) -> bool {
        matches!(self, SpawnOutcome::Spawned { .. })
    }
}

/// Inbox listing row, unread entries first
#[derive(Debug, Clone, PartialEq)]
pub struct InboxSummary {
    pub id: String,
    pub unread: bool,
    pub received_at: u64,
}

/// Everything the simulation needs injected at construction
pub struct SimulationDeps {
    pub content: ContentRepository,
    pub config: Box<dyn ConfigProvider>,
    pub save: SaveService,
    pub analytics: AnalyticsRecorder,
    pub ads: Box<dyn AdProvider>,
    pub purchases: Box<dyn PurchaseProvider>,
    pub confirm: Box<dyn ConfirmationPolicy>,
}

impl SimulationDeps {
    /// Bundled content, in-memory save and simulated collaborators - the
    /// default wiring for tests and headless runs
    pub fn simulated(seed: u32) -> Self {
        let content = ContentRepository::bundled();
        let known_skus = content
            .iap_catalog()
            .iter()
            .map(|sku| sku.id.to_string())
            .collect();
        Self {
            content,
            config: Box::new(crate::config::BundledConfigProvider::new()),
            save: SaveService::in_memory(),
            analytics: AnalyticsRecorder::new(),
            ads: Box::new(crate::collab::SimulatedAdProvider::new(seed)),
            purchases: Box::new(crate::collab::SimulatedPurchaseProvider::new(known_skus)),
            confirm: Box::new(crate::collab::AlwaysConfirm),
        }
    }
}

/// Collaborators and session-local bookkeeping, separated from the store
/// so state and context can be borrowed together
pub(crate) struct SimCtx {
    pub(crate) content: ContentRepository,
    pub(crate) config_provider: Box<dyn ConfigProvider>,
    pub(crate) save: SaveService,
    pub(crate) analytics: AnalyticsRecorder,
    pub(crate) ads: Box<dyn AdProvider>,
    pub(crate) purchases: Box<dyn PurchaseProvider>,
    pub(crate) confirm: Box<dyn ConfirmationPolicy>,
    pub(crate) rng: DeterministicRng,
    pub(crate) ids: IdGenerator,
    /// Timestamp of the last merge this session (drives streak reset)
    pub(crate) last_merge_at: u64,
    pub(crate) double_tap_cooldowns: HashMap<String, u64>,
    /// Re-entrancy guards for reward-applying collaborator flows
    pub(crate) ad_in_flight: bool,
    pub(crate) purchase_in_flight: bool,
    /// The fault boundary resets the save at most once per session
    pub(crate) fault_reset_applied: bool,
}

pub struct GameSimulation {
    pub(crate) ctx: SimCtx,
    pub(crate) store: Store<GameState>,
}

impl GameSimulation {
    /// Build a session: restore the save if one loads, otherwise start
    /// fresh. Applies offline energy catch-up and resumes a pending echo
    /// choice.
    pub fn new(deps: SimulationDeps, now_ms: u64) -> Result<Self, SimulationError> {
        let SimulationDeps {
            content,
            config,
            mut save,
            analytics,
            ads,
            purchases,
            confirm,
        } = deps;

        let base_config = config.get();
        let loaded = save.load(base_config);

        let mut ctx = SimCtx {
            content,
            config_provider: config,
            save,
            analytics,
            ads,
            purchases,
            confirm,
            rng: DeterministicRng::new(0),
            ids: IdGenerator::new(),
            last_merge_at: 0,
            double_tap_cooldowns: HashMap::new(),
            ad_in_flight: false,
            purchase_in_flight: false,
            fault_reset_applied: false,
        };

        let mut state = match loaded {
            Some(payload) => {
                let state = ctx.state_from_save(payload, now_ms);
                ctx.rng = DeterministicRng::restore(state.seed);
                ctx.ids = IdGenerator::starting_at(max_id_suffix(&state));
                state
            }
            None => {
                let seed = (now_ms % 2_147_483_647) as u32;
                ctx.rng = DeterministicRng::new(seed);
                let mut state =
                    GameState::fresh(base_config, &ctx.content, seed, now_ms);
                ctx.seed_initial_orders(&mut state);
                state
            }
        };

        ctx.fill_order_queue(&mut state);
        ctx.apply_offline_regen(&mut state, now_ms);
        ctx.sync_echo_id_list(&mut state);
        ctx.restore_choice_on_resume(&mut state)?;

        log::info!(
            "session started: level {}, {} items, {} letters",
            state.player.level,
            state.items.len(),
            state.letters.len()
        );

        let mut sim = Self {
            ctx,
            store: Store::new(state),
        };
        sim.store.publish();
        Ok(sim)
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn subscribe(&mut self, listener: Listener<GameState>) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.store.unsubscribe(id)
    }

    /// Persist a full snapshot, refreshing the stored RNG seed first
    pub fn save_now(&mut self) {
        let state = self.store.state_mut();
        state.seed = self.ctx.rng.snapshot();
        self.ctx.save.save_from_state(state);
        log::debug!("saved at {}", state.now);
    }

    /// Wipe the save and start over from defaults
    pub fn reset_save_and_state(&mut self) {
        self.ctx.save.clear();
        let now = self.store.state().now;
        let seed = (now % 2_147_483_647) as u32;
        self.ctx.rng = DeterministicRng::new(seed);
        let mut next = GameState::fresh(self.ctx.config_provider.get(), &self.ctx.content, seed, now);
        self.ctx.seed_initial_orders(&mut next);
        *self.store.state_mut() = next;
        log::info!("save and state reset");
        self.store.publish();
    }

    /// Pull a fresh config and re-clamp anything it bounds
    pub fn refresh_remote_config(&mut self) {
        let config = self.ctx.config_provider.refresh();
        let state = self.store.state_mut();
        state.config = config;
        state.energy.max = config.energy.max;
        state.energy.current = state.energy.current.min(state.energy.max);
        self.ctx.toast(state, "Remote config refreshed");
        self.store.publish();
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.store.state_mut().ui.sound_enabled = enabled;
        self.store.publish();
    }

    pub fn set_music_enabled(&mut self, enabled: bool) {
        self.store.state_mut().ui.music_enabled = enabled;
        self.store.publish();
    }

    pub fn toggle_ui_panel(&mut self, panel: UiPanel) {
        let ui = &mut self.store.state_mut().ui;
        match panel {
            UiPanel::Settings => ui.show_settings = !ui.show_settings,
            UiPanel::Debug => ui.show_debug = !ui.show_debug,
            UiPanel::Inbox => {
                ui.show_inbox = !ui.show_inbox;
                if !ui.show_inbox {
                    ui.selected_letter_id = None;
                }
            }
            UiPanel::Inventory => ui.show_inventory_modal = !ui.show_inventory_modal,
            UiPanel::Orders => ui.show_order_modal = !ui.show_order_modal,
        }
        self.store.publish();
    }

    /// The decor modal stays open while an echo choice is pending
    pub fn close_decor_modal(&mut self) {
        let state = self.store.state_mut();
        if state.echo.choice_state.is_none() {
            state.ui.show_decor_modal = false;
            self.store.publish();
        }
    }

    pub fn next_inventory_page(&mut self, direction: i32) {
        let state = self.store.state_mut();
        let page_count = state.inventory_capacity.div_ceil(INVENTORY_PAGE_SIZE).max(1);
        let current = state.ui.inventory_page as i64;
        let next = (current + direction as i64).clamp(0, page_count as i64 - 1);
        state.ui.inventory_page = next as usize;
        self.store.publish();
    }

    /// Rectangle an item is shown at, if it is visible on the current page
    pub fn item_rect(&self, uid: &str) -> Option<Rect> {
        let state = self.store.state();
        let item = state.items.get(uid)?;
        match item.container {
            ContainerKind::Board => Some(board_slot_to_rect(item.slot_index)),
            ContainerKind::Inventory => {
                let local =
                    inventory_global_to_visible(item.slot_index, state.ui.inventory_page)?;
                Some(inventory_slot_to_rect(local))
            }
        }
    }

    /// Item under the pointer, for starting a drag
    pub fn pickup_at(&self, x: f32, y: f32) -> Option<DragPickup> {
        let state = self.store.state();

        if let Some(slot) = point_to_board_slot(x, y) {
            if let Some(uid) = &state.board_slots[slot] {
                return Some(DragPickup {
                    item_id: uid.clone(),
                    rect: board_slot_to_rect(slot),
                });
            }
        }

        let slot =
            point_to_inventory_slot(x, y, state.inventory_capacity, state.ui.inventory_page)?;
        let uid = state.inventory_slots[slot].as_ref()?;
        let local = inventory_global_to_visible(slot, state.ui.inventory_page)?;
        Some(DragPickup {
            item_id: uid.clone(),
            rect: inventory_slot_to_rect(local),
        })
    }

    pub fn start_tooltip(&mut self, uid: &str, x: f32, y: f32) {
        let state = self.store.state_mut();
        if !state.items.contains_key(uid) {
            return;
        }
        state.ui.tooltip_item_id = Some(uid.to_string());
        state.ui.tooltip_position = Some((x, y));
        self.store.publish();
    }

    pub fn clear_tooltip(&mut self) {
        let state = self.store.state_mut();
        if state.ui.tooltip_item_id.is_some() {
            state.ui.tooltip_item_id = None;
            state.ui.tooltip_position = None;
            self.store.publish();
        }
    }

    /// Resolve a drag-release: special zones first (trash, echo slot, order
    /// drop), then slot targeting with merge/swap/move semantics
    pub fn drop_item(&mut self, uid: &str, x: f32, y: f32) -> Result<DropOutcome, SimulationError> {
        let state = self.store.state_mut();
        let Some(item) = state.items.get(uid).cloned() else {
            return Ok(DropOutcome::Invalid);
        };

        if TRASH_RECT.contains(x, y) {
            if self.ctx.try_scrap_item(state, uid)? {
                self.store.publish();
                return Ok(DropOutcome::Scrapped);
            }
            return Ok(DropOutcome::Invalid);
        }

        if ECHO_SLOT_RECT.contains(x, y) && item.is_echo {
            if self.ctx.open_echo_choice_for_item(state, uid) {
                self.store.publish();
                return Ok(DropOutcome::EchoSlot);
            }
            return Ok(DropOutcome::Invalid);
        }

        if ORDER_DROP_RECT.contains(x, y) {
            if self.ctx.try_complete_order_by_dragged_item(state, uid)? {
                self.store.publish();
                return Ok(DropOutcome::OrderDrop);
            }
            return Ok(DropOutcome::Invalid);
        }

        let Some((container, slot)) = resolve_drop_target(state, x, y) else {
            return Ok(DropOutcome::Invalid);
        };

        let target_uid = state.slot_item_id(container, slot).cloned();

        if target_uid.as_deref() == Some(uid) {
            return Ok(DropOutcome::Moved);
        }

        if let Some(target_uid) = target_uid {
            let target = state.items[&target_uid].clone();
            let merge_allowed =
                item.container == container || container == ContainerKind::Board;
            if merge_allowed
                && self.ctx.can_items_merge(&item, &target)
                && self.ctx.merge_items(state, uid, &target_uid, container, slot)?
            {
                self.ctx.resolve_chain_reaction(state, container)?;
                self.store.publish();
                return Ok(DropOutcome::Merged);
            }

            self.ctx.swap_items(state, uid, &target_uid);
            self.store.publish();
            return Ok(DropOutcome::Moved);
        }

        self.ctx.move_item_to(state, uid, container, slot);
        self.store.publish();
        Ok(DropOutcome::Moved)
    }

    /// Slot a drop at this point would target, for drag feedback
    pub fn preview_drop_target(&self, x: f32, y: f32) -> Option<(ContainerKind, usize)> {
        resolve_drop_target(self.store.state(), x, y)
    }

    pub fn item(&self, uid: &str) -> Option<&ItemInstance> {
        self.store.state().items.get(uid)
    }

    pub fn is_echo_choice_open(&self) -> bool {
        self.store.state().echo.choice_state.is_some()
    }

    /// Multi-line tooltip text for an item
    pub fn item_tooltip(&self, uid: &str) -> Result<Option<String>, SimulationError> {
        let state = self.store.state();
        let Some(item) = state.items.get(uid) else {
            return Ok(None);
        };
        let current = self.ctx.content.item(&item.item_id)?;
        let next = self.ctx.content.next_tier_item(&item.item_id)?;
        let next2 = match next {
            Some(id) => self.ctx.content.next_tier_item(id)?,
            None => None,
        };
        let source = match &item.source_generator_id {
            Some(id) => self.ctx.content.generator(id)?.name,
            None => "Unknown",
        };
        let name_of = |id: Option<&'static str>| -> Result<&'static str, ContentError> {
            match id {
                Some(id) => Ok(self.ctx.content.item(id)?.name),
                None => Ok("MAX"),
            }
        };
        Ok(Some(format!(
            "{} (Tier {})\nSource: {}\nSell: {}\nNext: {}\nThen: {}",
            current.name,
            item.tier,
            source,
            sell_value(item.tier),
            name_of(next)?,
            name_of(next2)?,
        )))
    }

    /// Scrap every tier 1-2 item after one confirmation. Returns coins
    /// granted.
    pub fn bulk_scrap_low_tier(&mut self) -> u64 {
        let state = self.store.state_mut();
        let candidates: Vec<String> = state
            .items
            .values()
            .filter(|item| item.tier <= 2)
            .map(|item| item.uid.clone())
            .collect();

        if candidates.is_empty() {
            self.ctx.toast(state, "No tier 1-2 items to scrap");
            self.store.publish();
            return 0;
        }

        let prompt = format!("Scrap {} tier 1-2 items?", candidates.len());
        if !self.ctx.confirm.confirm(&prompt) {
            return 0;
        }

        let mut total: u64 = 0;
        for uid in &candidates {
            if let Some(item) = state.items.get(uid) {
                total += u64::from(sell_value(item.tier));
            }
            self.ctx.delete_item(state, uid);
        }
        state.player.coins += total;
        let text = format!("Bulk scrapped +{total} coins");
        self.ctx.toast(state, text);
        self.store.publish();
        total
    }

    /// Spend energy to roll an item from a generator's drop table
    pub fn try_generator_spawn(
        &mut self,
        generator_id: &str,
    ) -> Result<SpawnOutcome, SimulationError> {
        let state = self.store.state_mut();
        let Some(generator) = state.generators.get(generator_id).cloned() else {
            return Ok(SpawnOutcome::Rejected(SpawnRejection::UnknownGenerator));
        };

        if state.energy.current < state.config.energy.generator_spawn_cost {
            return Ok(SpawnOutcome::Rejected(SpawnRejection::NotEnoughEnergy));
        }

        if generator.cooldown_end_at > state.now {
            return Ok(SpawnOutcome::Rejected(SpawnRejection::Cooldown));
        }

        let source = self.ctx.content.generator(generator_id)?;
        let level_data = source
            .levels
            .iter()
            .find(|entry| entry.level == generator.level)
            .unwrap_or(&source.levels[0]);
        let weights: Vec<f64> = level_data.drops.iter().map(|drop| drop.weight).collect();
        let selected = level_data.drops[self.ctx.rng.choose_weighted_index(&weights)].item_id;
        let cooldown_ms = level_data.cooldown_sec * 1000;

        state.energy.current -= state.config.energy.generator_spawn_cost;

        let empty_board = state.find_first_empty_board_slot();
        let empty_inventory = state.find_first_empty_inventory_slot();
        let (container, slot) = match (empty_board, empty_inventory) {
            (Some(slot), _) => (ContainerKind::Board, slot),
            (None, Some(slot)) => (ContainerKind::Inventory, slot),
            (None, None) => {
                // The charge is spent either way - same as the source game
                self.ctx.toast(state, "Board and inventory are full");
                self.store.publish();
                return Ok(SpawnOutcome::Rejected(SpawnRejection::NoSpace));
            }
        };

        self.ctx.spawn_item(
            state,
            selected,
            container,
            slot,
            Some(generator_id.to_string()),
            false,
            None,
        )?;

        if let Some(entry) = state.generators.get_mut(generator_id) {
            entry.cooldown_end_at = state.now + cooldown_ms;
        }

        let now = state.now;
        self.ctx.analytics.track(
            "generator_spawned",
            now,
            json!({ "generator_id": generator_id, "item_id": selected }),
        );
        self.ctx.record_action(state, "spawn_from_generator");
        self.ctx.increment_task(state, "spawn_generator", 1);
        self.store.publish();

        Ok(SpawnOutcome::Spawned {
            item_id: selected.to_string(),
        })
    }

    /// Rewarded-ad energy top-up, only offered at 10 energy or less
    pub fn watch_energy_ad(&mut self) -> bool {
        if self.ctx.ad_in_flight {
            log::warn!("energy ad already in flight");
            return false;
        }

        let state = self.store.state_mut();
        if state.energy.current > 10 {
            self.ctx.toast(state, "Energy ad appears only at 10 or less");
            self.store.publish();
            return false;
        }

        self.ctx.ad_in_flight = true;
        let policy = AdPolicy {
            cooldown_seconds: state.config.energy.rv_cooldown_seconds,
            daily_cap: state.config.energy.rv_daily_cap,
        };
        let result = self
            .ctx
            .ads
            .watch(AdPlacement::EnergyEmpty, state.now, policy);
        self.ctx.ad_in_flight = false;

        if !result.success {
            let reason = result.reason.unwrap_or(AdFailure::NoFill);
            let text = format!("Ad unavailable: {}", reason.as_str());
            self.ctx.toast(state, text);
            self.store.publish();
            return false;
        }

        let reward = state.config.energy.rv_reward;
        state.energy.current = (state.energy.current + reward).min(state.energy.max);
        state.energy.rv_last_watch_at = state.now;
        state.energy.rv_watches_today += 1;

        let now = state.now;
        self.ctx
            .analytics
            .track("ad_watched", now, json!({ "placement": "energy_empty" }));
        self.ctx.increment_task(state, "ad_watched", 1);
        let text = format!("+{reward} energy");
        self.ctx.toast(state, text);
        self.store.publish();
        true
    }

    /// Run a purchase through the store collaborator and grant the SKU's
    /// rewards on success
    pub fn purchase_sku(&mut self, sku_id: &str) -> bool {
        if self.ctx.purchase_in_flight {
            log::warn!("purchase already in flight");
            return false;
        }

        let state = self.store.state_mut();
        let now = state.now;
        self.ctx
            .analytics
            .track("iap_purchase_started", now, json!({ "sku_id": sku_id }));

        self.ctx.purchase_in_flight = true;
        let result = self.ctx.purchases.purchase(sku_id);
        self.ctx.purchase_in_flight = false;

        if !result.success {
            let reason = result
                .reason
                .map(|reason| reason.as_str())
                .unwrap_or("declined");
            self.ctx.analytics.track(
                "iap_purchase_failed",
                now,
                json!({ "sku_id": sku_id, "reason": reason }),
            );
            let text = format!("Purchase failed ({reason})");
            self.ctx.toast(state, text);
            self.store.publish();
            return false;
        }

        let sku = self
            .ctx
            .content
            .iap_catalog()
            .iter()
            .find(|sku| sku.id == sku_id);
        let display_name = sku.map(|sku| sku.display_name).unwrap_or(sku_id);
        if let Some(sku) = sku {
            state.player.coins += u64::from(sku.coins);
            state.player.stars += sku.stars;
            state.player.gems += sku.gems;
            state.energy.current = (state.energy.current + sku.energy).min(state.energy.max);
            let txn = result
                .transaction_id
                .clone()
                .unwrap_or_else(|| self.ctx.ids.make("txn"));
            state.purchase_history.push(txn);
        }

        self.ctx.analytics.track(
            "iap_purchase_success",
            now,
            json!({ "sku_id": sku_id, "transaction_id": result.transaction_id }),
        );
        let text = format!("Purchased {display_name}");
        self.ctx.toast(state, text);
        self.store.publish();
        true
    }

    /// Generators whose cooldown has elapsed
    pub fn ready_generator_ids(&self, now: u64) -> Vec<String> {
        self.store
            .state()
            .generators
            .values()
            .filter(|generator| generator.cooldown_end_at <= now)
            .map(|generator| generator.id.clone())
            .collect()
    }

    /// Spend the mini-mode entry cost if the feature is on
    pub fn consume_mini_mode_energy(&mut self) -> bool {
        let state = self.store.state_mut();
        if !state.config.features.match_mini_mode_enabled {
            self.ctx.toast(state, "Mini mode is disabled by config");
            self.store.publish();
            return false;
        }
        if state.energy.current < state.config.energy.mini_mode_entry_cost {
            self.ctx.toast(state, "Not enough energy");
            self.store.publish();
            return false;
        }
        state.energy.current -= state.config.energy.mini_mode_entry_cost;
        self.store.publish();
        true
    }

    pub fn debug_give_resources(&mut self, coins: u64, stars: u32, energy: u32) {
        let state = self.store.state_mut();
        state.player.coins += coins;
        state.player.stars += stars;
        state.energy.current = (state.energy.current + energy).min(state.energy.max);
        let text = format!("Debug +{coins}c +{stars}s +{energy}e");
        self.ctx.toast(state, text);
        self.store.publish();
    }

    /// Spawn an arbitrary content item into the first free slot
    pub fn debug_spawn_item(&mut self, item_id: &str) -> Result<bool, SimulationError> {
        let state = self.store.state_mut();
        let target = state
            .find_first_empty_board_slot()
            .map(|slot| (ContainerKind::Board, slot))
            .or_else(|| {
                state
                    .find_first_empty_inventory_slot()
                    .map(|slot| (ContainerKind::Inventory, slot))
            });
        let Some((container, slot)) = target else {
            return Ok(false);
        };
        self.ctx
            .spawn_item(state, item_id, container, slot, None, false, None)?;
        self.store.publish();
        Ok(true)
    }

    pub fn debug_clear_board(&mut self) {
        let state = self.store.state_mut();
        for slot in 0..state.board_slots.len() {
            if let Some(uid) = state.board_slots[slot].take() {
                state.items.remove(&uid);
            }
        }
        let items = &state.items;
        state
            .echo
            .active_echo_ids
            .retain(|uid| items.contains_key(uid));
        self.store.publish();
    }

    /// Grow the inventory toward the configured maximum
    pub fn expand_inventory_by(&mut self, slots: usize) -> bool {
        let state = self.store.state_mut();
        if slots == 0 {
            return false;
        }
        let next_capacity = (state.inventory_capacity + slots)
            .clamp(state.config.inventory.base_slots, state.config.inventory.max_slots);
        if next_capacity == state.inventory_capacity {
            return false;
        }
        state
            .inventory_slots
            .resize(next_capacity, None);
        state.inventory_capacity = next_capacity;
        let text = format!("Inventory expanded to {next_capacity}");
        self.ctx.toast(state, text);
        self.store.publish();
        true
    }

    pub fn dismiss_inbox_notice(&mut self) {
        self.store.state_mut().pending_inbox_notice = None;
        self.store.publish();
    }

    /// Warning stage for an inventory item approaching auto-conversion
    pub fn inventory_warning_stage(&self, uid: &str) -> Option<InventoryWarningStage> {
        let state = self.store.state();
        let item = state.items.get(uid)?;
        if item.container != ContainerKind::Inventory {
            return None;
        }
        let expires_at = item.inventory_expires_at?;
        let remaining = expires_at.saturating_sub(state.now);
        if remaining <= 60 * 60 * 1000 {
            Some(InventoryWarningStage::OneHour)
        } else if remaining <= 6 * 60 * 60 * 1000 {
            Some(InventoryWarningStage::SixHours)
        } else if remaining <= 24 * 60 * 60 * 1000 {
            Some(InventoryWarningStage::Day)
        } else {
            None
        }
    }

    /// Branch moment backing the open echo choice, if one is open
    pub fn current_branch_moment(&self) -> Result<Option<&BranchMomentDef>, SimulationError> {
        let state = self.store.state();
        let Some(choice) = &state.echo.choice_state else {
            return Ok(None);
        };
        Ok(Some(
            self.ctx.content.branch_moment(&choice.branch_moment_id)?,
        ))
    }

    pub fn order_definitions_for_active(&self) -> Result<Vec<&OrderDef>, SimulationError> {
        let state = self.store.state();
        let mut definitions = Vec::with_capacity(state.orders_active.len());
        for order in &state.orders_active {
            definitions.push(self.ctx.content.order(&order.definition_id)?);
        }
        Ok(definitions)
    }

    pub fn analytics_events(&self) -> &[AnalyticsEvent] {
        self.ctx.analytics.events()
    }

    pub fn generator_state(&self, generator_id: &str) -> Option<&GeneratorState> {
        self.store.state().generators.get(generator_id)
    }
}

/// Generic slot targeting: exact hit first, then nearest within snap range
fn resolve_drop_target(state: &GameState, x: f32, y: f32) -> Option<(ContainerKind, usize)> {
    if let Some(slot) = point_to_board_slot(x, y) {
        return Some((ContainerKind::Board, slot));
    }
    if let Some(slot) =
        point_to_inventory_slot(x, y, state.inventory_capacity, state.ui.inventory_page)
    {
        return Some((ContainerKind::Inventory, slot));
    }
    if let Some(slot) = nearest_board_slot(x, y) {
        return Some((ContainerKind::Board, slot));
    }
    if let Some(slot) =
        nearest_inventory_slot(x, y, state.inventory_capacity, state.ui.inventory_page)
    {
        return Some((ContainerKind::Inventory, slot));
    }
    None
}

/// Highest numeric suffix among persisted instance ids, so a restored
/// session's id generator never collides with loaded ids
fn max_id_suffix(state: &GameState) -> u64 {
    let item_ids = state.items.keys().map(String::as_str);
    let order_ids = state
        .orders_active
        .iter()
        .chain(state.orders_queued.iter())
        .map(|order| order.instance_id.as_str());
    item_ids
        .chain(order_ids)
        .filter_map(|id| id.rsplit('_').next())
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

impl SimCtx {
    pub(crate) fn toast(&mut self, state: &mut GameState, text: impl Into<String>) {
        state.ui.toasts.push(Toast {
            id: self.ids.make("toast"),
            text: text.into(),
            created_at: state.now,
        });
    }

    /// Create an item instance and claim its slot
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn spawn_item(
        &mut self,
        state: &mut GameState,
        item_id: &str,
        container: ContainerKind,
        slot: usize,
        source_generator_id: Option<String>,
        is_echo: bool,
        echo_expires_at: Option<u64>,
    ) -> Result<ItemInstance, ContentError> {
        let data = self.content.item(item_id)?;
        let chain = self.content.chain_of_item(item_id)?;

        let instance = ItemInstance {
            uid: self.ids.make("item"),
            item_id: item_id.to_string(),
            chain: chain.id,
            tier: data.tier,
            container,
            slot_index: slot,
            created_at: state.now,
            source_generator_id,
            is_echo,
            echo_expires_at,
            echo_warning_stage: None,
            inventory_expires_at: match container {
                ContainerKind::Inventory => {
                    Some(state.now + state.config.inventory.expiry_hours * 3600 * 1000)
                }
                ContainerKind::Board => None,
            },
        };

        match container {
            ContainerKind::Board => state.board_slots[slot] = Some(instance.uid.clone()),
            ContainerKind::Inventory => state.inventory_slots[slot] = Some(instance.uid.clone()),
        }
        if instance.is_echo {
            state.echo.active_echo_ids.push(instance.uid.clone());
        }
        state.items.insert(instance.uid.clone(), instance.clone());
        Ok(instance)
    }

    /// Remove an item and free its slot. Unknown uids are a no-op.
    pub(crate) fn delete_item(&mut self, state: &mut GameState, uid: &str) {
        let Some(item) = state.items.remove(uid) else {
            return;
        };
        match item.container {
            ContainerKind::Board => state.board_slots[item.slot_index] = None,
            ContainerKind::Inventory => state.inventory_slots[item.slot_index] = None,
        }
        if item.is_echo {
            state.echo.active_echo_ids.retain(|id| id != uid);
        }
    }

    /// Move an item, clearing its old slot before claiming the new one.
    /// Entering the inventory stamps the expiry clock; returning to the
    /// board clears it.
    pub(crate) fn move_item_to(
        &mut self,
        state: &mut GameState,
        uid: &str,
        container: ContainerKind,
        slot: usize,
    ) {
        let Some(item) = state.items.get_mut(uid) else {
            return;
        };

        let old_container = item.container;
        let old_slot = item.slot_index;

        item.container = container;
        item.slot_index = slot;
        item.inventory_expires_at = match container {
            ContainerKind::Inventory => {
                Some(state.now + state.config.inventory.expiry_hours * 3600 * 1000)
            }
            ContainerKind::Board => None,
        };

        match old_container {
            ContainerKind::Board => state.board_slots[old_slot] = None,
            ContainerKind::Inventory => state.inventory_slots[old_slot] = None,
        }
        match container {
            ContainerKind::Board => state.board_slots[slot] = Some(uid.to_string()),
            ContainerKind::Inventory => state.inventory_slots[slot] = Some(uid.to_string()),
        }
    }

    pub(crate) fn swap_items(&mut self, state: &mut GameState, a: &str, b: &str) {
        let Some(item_a) = state.items.get(a) else {
            return;
        };
        let Some(item_b) = state.items.get(b) else {
            return;
        };
        let (a_container, a_slot) = (item_a.container, item_a.slot_index);
        let (b_container, b_slot) = (item_b.container, item_b.slot_index);

        self.move_item_to(state, a, b_container, b_slot);
        self.move_item_to(state, b, a_container, a_slot);
    }

    /// Sell an item via the trash zone; high tiers go through the
    /// confirmation policy first
    pub(crate) fn try_scrap_item(
        &mut self,
        state: &mut GameState,
        uid: &str,
    ) -> Result<bool, ContentError> {
        let Some(item) = state.items.get(uid).cloned() else {
            return Ok(false);
        };
        if item.tier >= 5 {
            let name = self.content.item(&item.item_id)?.name;
            let prompt = format!("Sell {} (Tier {})?", name, item.tier);
            if !self.confirm.confirm(&prompt) {
                return Ok(false);
            }
        }

        let sell = sell_value(item.tier);
        state.player.coins += u64::from(sell);
        self.delete_item(state, uid);
        self.toast(state, format!("+{sell} coins"));
        Ok(true)
    }

    /// Rebuild state from a save payload. Items with out-of-range or
    /// contested slots are dropped rather than violating the slot/item
    /// invariant.
    fn state_from_save(&mut self, save: SaveDataV2, now_ms: u64) -> GameState {
        let config = save.remote_config_cache;
        let capacity = save.inventory_state.capacity.max(config.inventory.base_slots);
        let has_open_choice = save.echo_queue.choice_state.is_some();

        let mut state = GameState {
            config,
            seed: save.seed,
            now: now_ms,
            board_width: save.board_state.width,
            board_height: save.board_state.height,
            items: Default::default(),
            board_slots: vec![None; save.board_state.width * save.board_state.height],
            inventory_slots: vec![None; capacity],
            inventory_capacity: capacity,
            generators: save
                .generator_states
                .into_iter()
                .map(|generator| (generator.id.clone(), generator))
                .collect(),
            energy: save.energy_state,
            player: save.player_progress,
            decor: save.decor_choices,
            letters: save.letter_inbox,
            echo: save.echo_queue,
            orders_active: save
                .order_state
                .active
                .into_iter()
                .take(merge_manor_types::ACTIVE_ORDER_SLOTS)
                .collect(),
            orders_queued: save
                .order_state
                .queued
                .into_iter()
                .take(merge_manor_types::ORDER_QUEUE_DEPTH)
                .collect(),
            reroll: save.order_state.reroll,
            live_ops: save.event_progress,
            purchase_history: save.purchase_history,
            episode_completed_steps: save.episode_progress.completed_step_ids,
            episode_active_step_id: save.episode_progress.active_episode_step_id,
            pending_inbox_notice: None,
            ui: UiState {
                show_decor_modal: has_open_choice,
                ..UiState::default()
            },
        };

        for item in save
            .board_state
            .items
            .into_iter()
            .chain(save.inventory_state.items)
        {
            let placed = {
                let slots = match item.container {
                    ContainerKind::Board => &mut state.board_slots,
                    ContainerKind::Inventory => &mut state.inventory_slots,
                };
                match slots.get_mut(item.slot_index) {
                    Some(entry) if entry.is_none() => {
                        *entry = Some(item.uid.clone());
                        true
                    }
                    _ => false,
                }
            };
            if placed {
                state.items.insert(item.uid.clone(), item);
            } else {
                log::warn!("dropping saved item {} with unusable slot", item.uid);
            }
        }

        state
    }

    /// Session-start energy catch-up: whole regen intervals elapsed while
    /// away, capped by config. Distinct from per-tick regen, which is only
    /// capped by the energy maximum.
    fn apply_offline_regen(&mut self, state: &mut GameState, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(state.energy.last_tick_at);
        if elapsed == 0 {
            state.now = now_ms;
            return;
        }

        let step = state.config.energy.regen_seconds * 1000;
        let gained = (elapsed / step) as u32;
        let capped = gained.min(state.config.energy.offline_regen_cap);
        if capped > 0 {
            state.energy.current = (state.energy.current + capped).min(state.energy.max);
            self.toast(state, format!("Offline regen +{capped} energy"));
        }
        state.energy.last_tick_at = now_ms;
        state.now = now_ms;
    }

    /// Drop stale entries from the active-echo list (items that expired or
    /// were consumed while the save was written)
    fn sync_echo_id_list(&mut self, state: &mut GameState) {
        let items = &state.items;
        state
            .echo
            .active_echo_ids
            .retain(|uid| items.get(uid).is_some_and(|item| item.is_echo));
    }

    /// A choice left open across sessions resumes its modal; one older
    /// than 24 hours resolves to option A automatically.
    fn restore_choice_on_resume(&mut self, state: &mut GameState) -> Result<(), ContentError> {
        let Some(choice) = &state.echo.choice_state else {
            return Ok(());
        };

        if state.now.saturating_sub(choice.opened_at) > CHOICE_RESUME_CUTOFF_MS {
            self.resolve_echo_choice(state, merge_manor_types::EchoOption::A, true)?;
            return Ok(());
        }

        state.ui.show_decor_modal = true;
        Ok(())
    }
}
