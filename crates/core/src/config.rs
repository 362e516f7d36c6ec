//! Runtime-tunable configuration
//!
//! `GameConfig` is the remote-config payload: everything a live-ops team
//! would tweak without shipping a build. The active config is part of
//! `GameState` and can be replaced at runtime; the save caches the last
//! known copy so a restored session starts from the values it was tuned
//! with.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub match_mini_mode_enabled: bool,
    pub event_boost_enabled: bool,
    pub vip_bonus_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    pub max: u32,
    pub regen_seconds: u64,
    /// Cap on energy granted for time spent offline (per session start)
    pub offline_regen_cap: u32,
    pub generator_spawn_cost: u32,
    pub mini_mode_entry_cost: u32,
    /// Rewarded-ad energy grant and its gating
    pub rv_reward: u32,
    pub rv_cooldown_seconds: u64,
    pub rv_daily_cap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoConfig {
    pub base_chance: f64,
    pub early_game_chance: f64,
    pub early_game_level_cap: u32,
    pub new_room_boost: f64,
    pub streak_per_five_merges: f64,
    pub streak_max_bonus: f64,
    pub event_boost: f64,
    pub vip_boost: f64,
    /// Consecutive eligible misses that force the next roll to succeed
    pub pity_threshold: u32,
    pub max_active_echoes: usize,
    pub echo_lifetime_hours: u64,
    pub choice_grace_seconds: u64,
    pub pending_queue_max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub base_slots: usize,
    pub max_slots: usize,
    /// Items parked in the inventory auto-convert to coins after this long
    pub expiry_hours: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub schema_version: u32,
    pub features: FeatureFlags,
    pub energy: EnergyConfig,
    pub echo: EchoConfig,
    pub inventory: InventoryConfig,
    pub autosave_seconds: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            features: FeatureFlags {
                match_mini_mode_enabled: true,
                event_boost_enabled: false,
                vip_bonus_enabled: false,
            },
            energy: EnergyConfig {
                max: 100,
                regen_seconds: 90,
                offline_regen_cap: 40,
                generator_spawn_cost: 1,
                mini_mode_entry_cost: 8,
                rv_reward: 15,
                rv_cooldown_seconds: 180,
                rv_daily_cap: 5,
            },
            echo: EchoConfig {
                base_chance: 0.04,
                early_game_chance: 0.08,
                early_game_level_cap: 8,
                new_room_boost: 0.03,
                streak_per_five_merges: 0.01,
                streak_max_bonus: 0.05,
                event_boost: 0.02,
                vip_boost: 0.02,
                pity_threshold: 12,
                max_active_echoes: 2,
                echo_lifetime_hours: 48,
                choice_grace_seconds: 60,
                pending_queue_max: 3,
            },
            inventory: InventoryConfig {
                base_slots: 30,
                max_slots: 60,
                expiry_hours: 72,
            },
            autosave_seconds: 20,
        }
    }
}

/// Source of the active configuration. `refresh` models a network fetch:
/// implementations fall back to their bundled defaults on failure, so it
/// always yields a usable config and never errors.
pub trait ConfigProvider {
    fn get(&self) -> GameConfig;
    fn refresh(&mut self) -> GameConfig;
}

/// Provider backed only by the compiled-in defaults
#[derive(Debug, Default)]
pub struct BundledConfigProvider {
    config: GameConfig,
}

impl BundledConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigProvider for BundledConfigProvider {
    fn get(&self) -> GameConfig {
        self.config
    }

    fn refresh(&mut self) -> GameConfig {
        self.config = GameConfig::default();
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_sane() {
        let config = GameConfig::default();
        assert!(config.energy.max > 0);
        assert!(config.echo.base_chance > 0.0 && config.echo.base_chance < 1.0);
        assert!(config.inventory.base_slots <= config.inventory.max_slots);
        assert!(config.echo.max_active_echoes >= 1);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_bundled_provider_refresh_restores_defaults() {
        let mut provider = BundledConfigProvider::new();
        let refreshed = provider.refresh();
        assert_eq!(refreshed, GameConfig::default());
    }
}
