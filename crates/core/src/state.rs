//! Game state module - the single authoritative snapshot
//!
//! `GameState` holds everything the game knows between commits. It is
//! mutated in place by [`crate::sim::GameSimulation`] methods and published
//! through the store; no other component writes to it.
//!
//! Two invariants hold after every mutation:
//!
//! - Slot/item consistency: for every occupied board or inventory slot, the
//!   referenced item's `container`/`slot_index` agree with the slot array
//!   position, and every item is referenced by exactly the slot it names.
//! - Letter uniqueness: inbox letter ids are unique; delivery is idempotent.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use merge_manor_types::{
    ChainId, ContainerKind, EchoWarningStage, LetterMood, OrderType, ACTIVE_ORDER_SLOTS,
    BOARD_COLS, BOARD_ROWS, BOARD_SLOT_COUNT, ORDER_QUEUE_DEPTH,
};
use serde::{Deserialize, Serialize};

use crate::clock::day_key;
use crate::config::GameConfig;
use crate::content::ContentRepository;

/// Daily task templates: (task id, target count)
pub const TASK_TEMPLATES: [(&str, u32); 5] = [
    ("spawn_generator", 10),
    ("merge_completed", 8),
    ("order_completed", 3),
    ("letter_read", 1),
    ("ad_watched", 1),
];

/// One item resident on the board or in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Unique instance id (distinct from the content item id)
    pub uid: String,
    /// Content id, e.g. `wood_3`
    pub item_id: String,
    pub chain: ChainId,
    pub tier: u8,
    pub container: ContainerKind,
    pub slot_index: usize,
    pub created_at: u64,
    #[serde(default)]
    pub source_generator_id: Option<String>,
    pub is_echo: bool,
    #[serde(default)]
    pub echo_expires_at: Option<u64>,
    #[serde(default)]
    pub echo_warning_stage: Option<EchoWarningStage>,
    #[serde(default)]
    pub inventory_expires_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub id: String,
    pub level: u32,
    pub cooldown_end_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyState {
    pub current: u32,
    pub max: u32,
    /// Start of the regen interval currently in progress. Advanced only by
    /// whole intervals so fractional remainders carry into the next tick.
    pub last_tick_at: u64,
    pub rv_last_watch_at: u64,
    pub rv_watches_today: u32,
    pub rv_day_key: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub coins: u64,
    pub stars: u32,
    pub gems: u32,
    pub episode: u32,
    #[serde(default)]
    pub onboarding_flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorState {
    /// Selected style per room id
    pub room_styles: BTreeMap<String, String>,
    /// Flags set by branch-moment choices
    pub flags: BTreeMap<String, bool>,
    pub current_room_id: String,
    pub new_room_entered_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterEntry {
    pub id: String,
    pub title: String,
    pub body: String,
    pub mood: LetterMood,
    pub received_at: u64,
    #[serde(default)]
    pub read_at: Option<u64>,
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceState {
    pub echo_item_id: String,
    pub branch_moment_id: String,
    pub opened_at: u64,
    #[serde(default)]
    pub grace_deadline_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EchoState {
    /// Pity counter: eligible merges since the last echo
    pub eligible_merge_miss_count: u32,
    pub consecutive_merge_count: u32,
    pub active_echo_ids: Vec<String>,
    /// Echo items waiting for a free slot
    pub pending_echo_item_ids: Vec<String>,
    /// Branch moments queued by order completions
    pub pending_branch_moment_ids: Vec<String>,
    #[serde(default)]
    pub choice_state: Option<ChoiceState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInstance {
    pub instance_id: String,
    pub definition_id: String,
    pub order_type: OrderType,
    pub created_at: u64,
    #[serde(default)]
    pub expires_at: Option<u64>,
    /// Last time this slot was (re)filled; unforced orders rotate after 24h
    pub forced_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerollState {
    pub day_key: u64,
    pub free_used: bool,
    pub gem_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTaskProgress {
    pub id: String,
    pub target: u32,
    pub progress: u32,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveOpsState {
    pub daily_task_day_key: u64,
    pub daily_tasks: Vec<DailyTaskProgress>,
    pub bonus_chest_claimed: bool,
    pub login_day_key: u64,
    pub login_streak: u32,
    pub login_claimed_today: bool,
    pub weekly_event_week_key: u64,
    pub weekly_event_points: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: String,
    pub text: String,
    pub created_at: u64,
}

/// Ephemeral presentation state. Published with the snapshot but never
/// persisted; a fresh session starts with everything closed.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub show_settings: bool,
    pub show_debug: bool,
    pub show_inbox: bool,
    pub selected_letter_id: Option<String>,
    pub show_inventory_modal: bool,
    pub show_decor_modal: bool,
    pub show_order_modal: bool,
    pub tooltip_item_id: Option<String>,
    pub tooltip_position: Option<(f32, f32)>,
    pub toasts: Vec<Toast>,
    pub overlay_fade_until: u64,
    pub paused: bool,
    pub inventory_page: usize,
    pub sound_enabled: bool,
    pub music_enabled: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_settings: false,
            show_debug: false,
            show_inbox: false,
            selected_letter_id: None,
            show_inventory_modal: false,
            show_decor_modal: false,
            show_order_modal: false,
            tooltip_item_id: None,
            tooltip_position: None,
            toasts: Vec::new(),
            overlay_fade_until: 0,
            paused: false,
            inventory_page: 0,
            sound_enabled: true,
            music_enabled: true,
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    /// RNG state snapshot, refreshed on save so replay stays deterministic
    pub seed: u32,
    /// Timestamp of the most recent tick or operation (epoch ms)
    pub now: u64,
    pub board_width: usize,
    pub board_height: usize,
    /// Items in a BTreeMap: uid order is creation order, so every scan over
    /// the map is deterministic
    pub items: BTreeMap<String, ItemInstance>,
    pub board_slots: Vec<Option<String>>,
    pub inventory_slots: Vec<Option<String>>,
    pub inventory_capacity: usize,
    pub generators: BTreeMap<String, GeneratorState>,
    pub energy: EnergyState,
    pub player: PlayerProgress,
    pub decor: DecorState,
    pub letters: Vec<LetterEntry>,
    pub echo: EchoState,
    pub orders_active: ArrayVec<OrderInstance, ACTIVE_ORDER_SLOTS>,
    pub orders_queued: ArrayVec<OrderInstance, ORDER_QUEUE_DEPTH>,
    pub reroll: RerollState,
    pub live_ops: LiveOpsState,
    pub purchase_history: Vec<String>,
    pub episode_completed_steps: Vec<String>,
    pub episode_active_step_id: Option<String>,
    pub pending_inbox_notice: Option<String>,
    pub ui: UiState,
}

pub fn default_daily_tasks() -> Vec<DailyTaskProgress> {
    TASK_TEMPLATES
        .iter()
        .map(|&(id, target)| DailyTaskProgress {
            id: id.to_string(),
            target,
            progress: 0,
            complete: false,
        })
        .collect()
}

impl GameState {
    /// Fresh default state. Orders are seeded afterwards by the simulation
    /// (they draw from the RNG).
    pub fn fresh(config: GameConfig, content: &ContentRepository, seed: u32, now: u64) -> Self {
        let mut room_styles = BTreeMap::new();
        for room in content.rooms() {
            if let Some(style) = room.styles.first() {
                room_styles.insert(room.id.to_string(), style.id.to_string());
            }
        }

        let mut generators = BTreeMap::new();
        for generator in ["toolbox", "pantry"] {
            generators.insert(
                generator.to_string(),
                GeneratorState {
                    id: generator.to_string(),
                    level: 1,
                    cooldown_end_at: 0,
                },
            );
        }

        let today = day_key(now);
        Self {
            config,
            seed,
            now,
            board_width: BOARD_COLS,
            board_height: BOARD_ROWS,
            items: BTreeMap::new(),
            board_slots: vec![None; BOARD_SLOT_COUNT],
            inventory_slots: vec![None; config.inventory.base_slots],
            inventory_capacity: config.inventory.base_slots,
            generators,
            energy: EnergyState {
                current: config.energy.max,
                max: config.energy.max,
                last_tick_at: now,
                rv_last_watch_at: 0,
                rv_watches_today: 0,
                rv_day_key: today,
            },
            player: PlayerProgress {
                level: 1,
                xp: 0,
                xp_to_next: 100,
                coins: 200,
                stars: 0,
                gems: 30,
                episode: 1,
                onboarding_flags: BTreeMap::new(),
            },
            decor: DecorState {
                room_styles,
                flags: BTreeMap::new(),
                current_room_id: "entrance_hall".to_string(),
                new_room_entered_at: now,
            },
            letters: Vec::new(),
            echo: EchoState::default(),
            orders_active: ArrayVec::new(),
            orders_queued: ArrayVec::new(),
            reroll: RerollState {
                day_key: today,
                free_used: false,
                gem_cost: 10,
            },
            live_ops: LiveOpsState {
                daily_task_day_key: today,
                daily_tasks: default_daily_tasks(),
                bonus_chest_claimed: false,
                login_day_key: today,
                login_streak: 1,
                login_claimed_today: false,
                weekly_event_week_key: crate::clock::week_key(now),
                weekly_event_points: 0,
            },
            purchase_history: Vec::new(),
            episode_completed_steps: Vec::new(),
            episode_active_step_id: content
                .episodes()
                .first()
                .and_then(|episode| episode.steps.first())
                .map(|step| step.id.to_string()),
            pending_inbox_notice: None,
            ui: UiState::default(),
        }
    }

    /// Id of the item occupying a slot, if any
    pub fn slot_item_id(&self, container: ContainerKind, slot: usize) -> Option<&String> {
        let slots = match container {
            ContainerKind::Board => &self.board_slots,
            ContainerKind::Inventory => &self.inventory_slots,
        };
        slots.get(slot).and_then(|entry| entry.as_ref())
    }

    pub fn find_first_empty_board_slot(&self) -> Option<usize> {
        self.board_slots.iter().position(|slot| slot.is_none())
    }

    pub fn find_first_empty_inventory_slot(&self) -> Option<usize> {
        self.inventory_slots.iter().position(|slot| slot.is_none())
    }

    /// Verify the bidirectional slot/item invariant. Returns a description
    /// of the first violation, if any.
    pub fn check_slot_consistency(&self) -> Result<(), String> {
        for (slot, entry) in self.board_slots.iter().enumerate() {
            if let Some(uid) = entry {
                let item = self
                    .items
                    .get(uid)
                    .ok_or_else(|| format!("board slot {slot} references missing item {uid}"))?;
                if item.container != ContainerKind::Board || item.slot_index != slot {
                    return Err(format!(
                        "board slot {slot} disagrees with item {uid} ({:?} slot {})",
                        item.container, item.slot_index
                    ));
                }
            }
        }
        for (slot, entry) in self.inventory_slots.iter().enumerate() {
            if let Some(uid) = entry {
                let item = self
                    .items
                    .get(uid)
                    .ok_or_else(|| format!("inventory slot {slot} references missing item {uid}"))?;
                if item.container != ContainerKind::Inventory || item.slot_index != slot {
                    return Err(format!(
                        "inventory slot {slot} disagrees with item {uid} ({:?} slot {})",
                        item.container, item.slot_index
                    ));
                }
            }
        }
        for (uid, item) in &self.items {
            let claimed = self.slot_item_id(item.container, item.slot_index);
            if claimed != Some(uid) {
                return Err(format!(
                    "item {uid} claims {:?} slot {} but the slot holds {claimed:?}",
                    item.container, item.slot_index
                ));
            }
        }
        Ok(())
    }
}
