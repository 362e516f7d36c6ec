//! Persistence module - versioned full-state saves with a migration chain
//!
//! Saves are JSON payloads in a key-value store (one key per schema
//! version, mirroring a browser's local storage). `load` returns the
//! latest-version payload; an older payload is migrated in memory by the
//! explicit `v1 -> v2` step and immediately re-written at the new version.
//! Corrupt payloads clear their slot and load as `None` - a bad save never
//! takes the game down.
//!
//! Writes are always complete snapshots; there is no partial or
//! incremental save path.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use merge_manor_types::ContainerKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::state::{
    DecorState, EchoState, EnergyState, GameState, GeneratorState, ItemInstance, LetterEntry,
    LiveOpsState, OrderInstance, PlayerProgress, RerollState,
};

pub const SAVE_KEY: &str = "merge_manor_save_v2";
pub const LEGACY_SAVE_KEY: &str = "merge_manor_save_v1";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unsupported save version: {0}")]
    UnsupportedVersion(u64),
    #[error("save payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySaveState {
    pub capacity: usize,
    pub items: Vec<ItemInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSaveState {
    pub width: usize,
    pub height: usize,
    pub items: Vec<ItemInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSaveState {
    pub active: Vec<OrderInstance>,
    pub queued: Vec<OrderInstance>,
    pub reroll: RerollState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeProgressV1 {
    pub completed_step_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeProgressV2 {
    pub completed_step_ids: Vec<String>,
    #[serde(default)]
    pub active_episode_step_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDataV1 {
    pub version: u32,
    pub seed: u32,
    pub player_progress: PlayerProgress,
    pub inventory_state: InventorySaveState,
    pub board_state: BoardSaveState,
    pub generator_states: Vec<GeneratorState>,
    pub episode_progress: EpisodeProgressV1,
    pub decor_choices: DecorState,
    pub letter_inbox: Vec<LetterEntry>,
    pub echo_queue: EchoState,
    pub event_progress: LiveOpsState,
    pub purchase_history: Vec<String>,
    pub order_state: OrderSaveState,
    pub energy_state: EnergyState,
    pub saved_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDataV2 {
    pub version: u32,
    pub seed: u32,
    pub player_progress: PlayerProgress,
    pub inventory_state: InventorySaveState,
    pub board_state: BoardSaveState,
    pub generator_states: Vec<GeneratorState>,
    pub episode_progress: EpisodeProgressV2,
    pub decor_choices: DecorState,
    pub letter_inbox: Vec<LetterEntry>,
    pub echo_queue: EchoState,
    pub event_progress: LiveOpsState,
    pub purchase_history: Vec<String>,
    pub order_state: OrderSaveState,
    pub energy_state: EnergyState,
    /// Config the session last ran with; restoring starts from these values
    pub remote_config_cache: GameConfig,
    pub saved_at: u64,
}

/// All save schema versions as a tagged variant
#[derive(Debug, Clone, PartialEq)]
pub enum SaveData {
    V1(SaveDataV1),
    V2(SaveDataV2),
}

impl SaveData {
    /// Parse a raw payload, dispatching on its `version` field
    pub fn parse(raw: &str) -> Result<Self, SaveError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        match value.get("version").and_then(serde_json::Value::as_u64) {
            Some(1) => Ok(SaveData::V1(serde_json::from_value(value)?)),
            Some(2) => Ok(SaveData::V2(serde_json::from_value(value)?)),
            Some(other) => Err(SaveError::UnsupportedVersion(other)),
            None => Err(SaveError::UnsupportedVersion(0)),
        }
    }
}

/// Pure migration step: v1 saves predate the remote-config cache and the
/// active-episode-step pointer. The active step is inferred as the last
/// completed step (the next one is recomputed on the first action).
pub fn migrate_v1_to_v2(v1: SaveDataV1, config: GameConfig) -> SaveDataV2 {
    let active_episode_step_id = v1.episode_progress.completed_step_ids.last().cloned();
    SaveDataV2 {
        version: 2,
        seed: v1.seed,
        player_progress: v1.player_progress,
        inventory_state: v1.inventory_state,
        board_state: v1.board_state,
        generator_states: v1.generator_states,
        episode_progress: EpisodeProgressV2 {
            completed_step_ids: v1.episode_progress.completed_step_ids,
            active_episode_step_id,
        },
        decor_choices: v1.decor_choices,
        letter_inbox: v1.letter_inbox,
        echo_queue: v1.echo_queue,
        event_progress: v1.event_progress,
        purchase_history: v1.purchase_history,
        order_state: v1.order_state,
        energy_state: v1.energy_state,
        remote_config_cache: config,
        saved_at: v1.saved_at,
    }
}

/// Minimal key-value persistence surface (the shape of local storage)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and headless sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// File-backed store: one `<key>.json` file per key under a directory
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(error) = fs::create_dir_all(&self.dir) {
            log::warn!("save dir unavailable: {error}");
            return;
        }
        if let Err(error) = fs::write(self.path_for(key), value) {
            log::warn!("save write failed for {key}: {error}");
        }
    }

    fn remove(&mut self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}

/// Versioned save access over a key-value store
pub struct SaveService {
    store: Box<dyn KeyValueStore>,
}

impl SaveService {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Load the latest save, migrating older versions forward. Corrupt
    /// payloads clear their slot and return `None`.
    pub fn load(&mut self, config: GameConfig) -> Option<SaveDataV2> {
        if let Some(raw) = self.store.get(SAVE_KEY) {
            match SaveData::parse(&raw) {
                Ok(SaveData::V2(save)) => return Some(save),
                Ok(SaveData::V1(save)) => {
                    // A v1 payload under the v2 key still migrates cleanly
                    let migrated = migrate_v1_to_v2(save, config);
                    self.write(&migrated);
                    return Some(migrated);
                }
                Err(error) => {
                    log::warn!("corrupt save cleared: {error}");
                    self.store.remove(SAVE_KEY);
                    return None;
                }
            }
        }

        if let Some(raw) = self.store.get(LEGACY_SAVE_KEY) {
            match SaveData::parse(&raw) {
                Ok(SaveData::V1(save)) => {
                    let migrated = migrate_v1_to_v2(save, config);
                    self.write(&migrated);
                    return Some(migrated);
                }
                Ok(SaveData::V2(save)) => return Some(save),
                Err(error) => {
                    log::warn!("corrupt legacy save cleared: {error}");
                    self.store.remove(LEGACY_SAVE_KEY);
                    return None;
                }
            }
        }

        None
    }

    /// Write a full-state snapshot at the current version
    pub fn save_from_state(&mut self, state: &GameState) {
        let payload = SaveDataV2 {
            version: 2,
            seed: state.seed,
            player_progress: state.player.clone(),
            inventory_state: InventorySaveState {
                capacity: state.inventory_capacity,
                items: state
                    .items
                    .values()
                    .filter(|item| item.container == ContainerKind::Inventory)
                    .cloned()
                    .collect(),
            },
            board_state: BoardSaveState {
                width: state.board_width,
                height: state.board_height,
                items: state
                    .items
                    .values()
                    .filter(|item| item.container == ContainerKind::Board)
                    .cloned()
                    .collect(),
            },
            generator_states: state.generators.values().cloned().collect(),
            episode_progress: EpisodeProgressV2 {
                completed_step_ids: state.episode_completed_steps.clone(),
                active_episode_step_id: state.episode_active_step_id.clone(),
            },
            decor_choices: state.decor.clone(),
            letter_inbox: state.letters.clone(),
            echo_queue: state.echo.clone(),
            event_progress: state.live_ops.clone(),
            purchase_history: state.purchase_history.clone(),
            order_state: OrderSaveState {
                active: state.orders_active.to_vec(),
                queued: state.orders_queued.to_vec(),
                reroll: state.reroll,
            },
            energy_state: state.energy,
            remote_config_cache: state.config,
            saved_at: state.now,
        };
        self.write(&payload);
    }

    pub fn clear(&mut self) {
        self.store.remove(SAVE_KEY);
        self.store.remove(LEGACY_SAVE_KEY);
    }

    fn write(&mut self, payload: &SaveDataV2) {
        match serde_json::to_string(payload) {
            Ok(raw) => self.store.set(SAVE_KEY, &raw),
            Err(error) => log::warn!("save serialization failed: {error}"),
        }
    }
}
