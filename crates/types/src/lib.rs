//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the simulation.
//! All types are pure data structures with no behavior dependencies, making
//! them usable in any context (core logic, persistence, a presentation layer).
//!
//! # Board Dimensions
//!
//! The merge board is an 8x7 grid addressed by flat slot index
//! (`row * BOARD_COLS + col`). The inventory is a single flat sequence,
//! presented 15 slots per page (5 columns x 3 rows).
//!
//! # Coordinate Space
//!
//! All geometry constants live in a fixed 1080x1920 virtual canvas. The
//! simulation never touches a real screen; a renderer maps the virtual
//! canvas to device pixels on its own.

use serde::{Deserialize, Serialize};

/// Board dimensions
pub const BOARD_COLS: usize = 8;
pub const BOARD_ROWS: usize = 7;
pub const BOARD_SLOT_COUNT: usize = BOARD_COLS * BOARD_ROWS;

/// Virtual canvas dimensions
pub const VIRTUAL_WIDTH: f32 = 1080.0;
pub const VIRTUAL_HEIGHT: f32 = 1920.0;

/// Board geometry (virtual canvas units)
pub const BOARD_SLOT_SIZE: f32 = 118.0;
pub const BOARD_GAP: f32 = 8.0;
pub const BOARD_X: f32 = 40.0;
pub const BOARD_Y: f32 = 220.0;

/// Inventory geometry
pub const INVENTORY_COLS: usize = 5;
pub const INVENTORY_ROWS_PER_PAGE: usize = 3;
pub const INVENTORY_PAGE_SIZE: usize = INVENTORY_COLS * INVENTORY_ROWS_PER_PAGE;
pub const INVENTORY_SLOT_SIZE: f32 = 94.0;
pub const INVENTORY_GAP: f32 = 10.0;
pub const INVENTORY_X: f32 = 70.0;
pub const INVENTORY_Y: f32 = 1320.0;

/// Maximum distance from a slot center that still snaps a dropped item
pub const SNAP_DISTANCE: f32 = 20.0;

/// Item tiers run 1..=MAX_TIER; MAX_TIER items never merge further
pub const MAX_TIER: u8 = 8;

/// Coin value granted when scrapping an item, indexed by `tier - 1`
pub const SELL_VALUES_BY_TIER: [u32; MAX_TIER as usize] = [1, 3, 8, 20, 50, 120, 300, 800];

/// Order slot shape: fixed active slots plus a small replacement queue
pub const ACTIVE_ORDER_SLOTS: usize = 3;
pub const ORDER_QUEUE_DEPTH: usize = 2;

/// Timing windows (milliseconds)
pub const MERGE_STREAK_RESET_MS: u64 = 7_000;
pub const TOAST_LIFETIME_MS: u64 = 2_800;
pub const ORDER_FORCE_ROTATE_MS: u64 = 24 * 60 * 60 * 1000;
pub const CHOICE_RESUME_CUTOFF_MS: u64 = 24 * 60 * 60 * 1000;
pub const NEW_ROOM_ECHO_BONUS_MS: u64 = 10 * 60 * 1000;
pub const DOUBLE_TAP_MERGE_COOLDOWN_MS: u64 = 2_000;

/// Name substituted into letter bodies
pub const PLAYER_NAME: &str = "Caretaker";

/// Coin value for scrapping an item of the given tier (tiers outside 1..=8
/// fall back to 1, matching the content tables' lowest value)
pub fn sell_value(tier: u8) -> u32 {
    if tier == 0 || tier > MAX_TIER {
        return 1;
    }
    SELL_VALUES_BY_TIER[(tier - 1) as usize]
}

/// Item chain families - each chain spans 8 tiers of the same theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainId {
    Woodworking,
    Oceanic,
    Culinary,
    Tech,
}

impl ChainId {
    pub const ALL: [ChainId; 4] = [
        ChainId::Woodworking,
        ChainId::Oceanic,
        ChainId::Culinary,
        ChainId::Tech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Woodworking => "woodworking",
            ChainId::Oceanic => "oceanic",
            ChainId::Culinary => "culinary",
            ChainId::Tech => "tech",
        }
    }
}

/// Which container an item currently occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Board,
    Inventory,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Board => "board",
            ContainerKind::Inventory => "inventory",
        }
    }
}

/// Order flavors (purely descriptive; completion rules are identical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    RenovationOrder,
    DecorChoiceOrder,
    CookingOrder,
    RepairCraftOrder,
    GuestOrder,
    MysteryClueOrder,
}

/// Tone tag attached to inbox letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterMood {
    Hopeful,
    Mystery,
    Warm,
    Urgent,
    Reflective,
}

/// Remaining-lifetime warning stage for an active echo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EchoWarningStage {
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "10m")]
    TenMinutes,
}

impl EchoWarningStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EchoWarningStage::SixHours => "6h",
            EchoWarningStage::OneHour => "1h",
            EchoWarningStage::TenMinutes => "10m",
        }
    }
}

/// Remaining-lifetime warning stage for an inventory item nearing expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryWarningStage {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1h")]
    OneHour,
}

/// The two mutually exclusive options of a branch moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EchoOption {
    A,
    B,
}

/// Overlay panels a presentation layer can toggle through the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiPanel {
    Settings,
    Debug,
    Inbox,
    Inventory,
    Orders,
}

/// Outcome of a drag-and-drop gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Item moved to an empty slot or swapped with the occupant
    Moved,
    /// Item merged with the occupant of the target slot
    Merged,
    /// Drop rejected; nothing changed
    Invalid,
    /// Item sold via the trash zone
    Scrapped,
    /// Echo item placed on the echo zone; a branch choice is now open
    EchoSlot,
    /// Item contributed to an active order, completing it
    OrderDrop,
}

impl DropOutcome {
    pub fn valid(&self) -> bool {
        !matches!(self, DropOutcome::Invalid)
    }
}

/// Axis-aligned rectangle in virtual canvas units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.w && y <= self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Special drop zones (virtual canvas units)
pub const TRASH_RECT: Rect = Rect::new(880.0, 1660.0, 150.0, 150.0);
pub const ECHO_SLOT_RECT: Rect = Rect::new(430.0, 1650.0, 220.0, 180.0);
pub const ORDER_DROP_RECT: Rect = Rect::new(140.0, 1650.0, 250.0, 180.0);
