//! Collaborator contracts - injected services the simulation talks to
//!
//! Ads, purchases and destructive-action confirmation are host concerns;
//! the simulation only sees these traits. Every implementation here is
//! deterministic so tests can drive the full flows without a host. The id
//! generator and analytics recorder are explicit context objects handed to
//! the simulation at construction - no module-level singletons.

use std::collections::HashMap;

use serde_json::Value;

use crate::clock::day_key;
use crate::rng::DeterministicRng;

/// Rewarded-ad placements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdPlacement {
    EnergyEmpty,
    DoubleOrderReward,
    EchoBonus,
    DailyTaskSkip,
    InventoryExpandOffer,
}

impl AdPlacement {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPlacement::EnergyEmpty => "energy_empty",
            AdPlacement::DoubleOrderReward => "double_order_reward",
            AdPlacement::EchoBonus => "echo_bonus",
            AdPlacement::DailyTaskSkip => "daily_task_skip",
            AdPlacement::InventoryExpandOffer => "inventory_expand_offer",
        }
    }
}

/// Gating applied to a single watch request
#[derive(Debug, Clone, Copy, Default)]
pub struct AdPolicy {
    pub cooldown_seconds: u64,
    pub daily_cap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdFailure {
    DailyCapReached,
    Cooldown,
    NoFill,
    /// Another watch is already being applied (re-entrancy guard)
    InProgress,
}

impl AdFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdFailure::DailyCapReached => "daily_cap_reached",
            AdFailure::Cooldown => "cooldown",
            AdFailure::NoFill => "no_fill",
            AdFailure::InProgress => "in_progress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdResult {
    pub success: bool,
    pub reason: Option<AdFailure>,
}

/// Rewarded-ad collaborator. The wait for the ad itself happens inside
/// `watch`; the simulation applies rewards only after it returns.
pub trait AdProvider {
    fn watch(&mut self, placement: AdPlacement, now_ms: u64, policy: AdPolicy) -> AdResult;
}

struct PlacementCounter {
    day_key: u64,
    count: u32,
    last_watch_at: u64,
}

/// Deterministic stand-in for an ad SDK: enforces cooldown and daily caps,
/// fills 90% of eligible requests.
pub struct SimulatedAdProvider {
    rng: DeterministicRng,
    counters: HashMap<AdPlacement, PlacementCounter>,
}

impl SimulatedAdProvider {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            counters: HashMap::new(),
        }
    }
}

impl AdProvider for SimulatedAdProvider {
    fn watch(&mut self, placement: AdPlacement, now_ms: u64, policy: AdPolicy) -> AdResult {
        let today = day_key(now_ms);
        let entry = self.counters.entry(placement).or_insert(PlacementCounter {
            day_key: today,
            count: 0,
            last_watch_at: 0,
        });

        if entry.day_key != today {
            entry.day_key = today;
            entry.count = 0;
        }

        if policy.daily_cap > 0 && entry.count >= policy.daily_cap {
            return AdResult {
                success: false,
                reason: Some(AdFailure::DailyCapReached),
            };
        }

        if policy.cooldown_seconds > 0
            && now_ms.saturating_sub(entry.last_watch_at) < policy.cooldown_seconds * 1000
        {
            return AdResult {
                success: false,
                reason: Some(AdFailure::Cooldown),
            };
        }

        let success = self.rng.next_f64() <= 0.9;
        entry.last_watch_at = now_ms;
        if success {
            entry.count += 1;
        }

        AdResult {
            success,
            reason: if success { None } else { Some(AdFailure::NoFill) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseFailure {
    UnknownSku,
    Declined,
    /// Another purchase is already being applied (re-entrancy guard)
    InProgress,
}

impl PurchaseFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseFailure::UnknownSku => "unknown_sku",
            PurchaseFailure::Declined => "declined",
            PurchaseFailure::InProgress => "in_progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseResult {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub reason: Option<PurchaseFailure>,
}

/// Purchase collaborator; resolves fully before the simulation grants
/// anything
pub trait PurchaseProvider {
    fn purchase(&mut self, sku_id: &str) -> PurchaseResult;
}

/// Always-approving store stub with deterministic transaction ids
pub struct SimulatedPurchaseProvider {
    known_skus: Vec<String>,
    counter: u64,
}

impl SimulatedPurchaseProvider {
    pub fn new(known_skus: Vec<String>) -> Self {
        Self {
            known_skus,
            counter: 0,
        }
    }
}

impl PurchaseProvider for SimulatedPurchaseProvider {
    fn purchase(&mut self, sku_id: &str) -> PurchaseResult {
        if !self.known_skus.iter().any(|known| known == sku_id) {
            return PurchaseResult {
                success: false,
                transaction_id: None,
                reason: Some(PurchaseFailure::UnknownSku),
            };
        }
        self.counter += 1;
        PurchaseResult {
            success: true,
            transaction_id: Some(format!("txn_sim_{:06}", self.counter)),
            reason: None,
        }
    }
}

/// Yes/no gate for destructive actions (tier>=5 scrap, bulk scrap).
/// Interactive hosts wire a dialog; tests inject a fixed answer.
pub trait ConfirmationPolicy {
    fn confirm(&self, prompt: &str) -> bool;
}

pub struct AlwaysConfirm;

impl ConfirmationPolicy for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub struct AlwaysDeny;

impl ConfirmationPolicy for AlwaysDeny {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub at: u64,
    pub payload: Value,
}

const MAX_ANALYTICS_EVENTS: usize = 200;

/// Fire-and-forget event recorder with a bounded buffer. Never blocks and
/// never affects simulation correctness.
#[derive(Debug, Default)]
pub struct AnalyticsRecorder {
    events: Vec<AnalyticsEvent>,
}

impl AnalyticsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, name: &str, at: u64, payload: Value) {
        log::debug!("analytics {name} {payload}");
        self.events.push(AnalyticsEvent {
            name: name.to_string(),
            at,
            payload,
        });
        if self.events.len() > MAX_ANALYTICS_EVENTS {
            let excess = self.events.len() - MAX_ANALYTICS_EVENTS;
            self.events.drain(..excess);
        }
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> &[AnalyticsEvent] {
        &self.events
    }
}

/// Counter-based instance id service
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume numbering above ids already present in a restored save
    pub fn starting_at(counter: u64) -> Self {
        Self { counter }
    }

    pub fn make(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{:06}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_monotonic() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.make("item"), "item_000001");
        assert_eq!(ids.make("toast"), "toast_000002");
        assert_eq!(ids.make("item"), "item_000003");
    }

    #[test]
    fn test_ad_provider_daily_cap() {
        let mut ads = SimulatedAdProvider::new(1);
        let policy = AdPolicy {
            cooldown_seconds: 0,
            daily_cap: 2,
        };

        let mut fills = 0;
        for _ in 0..50 {
            if ads.watch(AdPlacement::EnergyEmpty, 1_000_000, policy).success {
                fills += 1;
            }
        }
        assert_eq!(fills, 2);
        let capped = ads.watch(AdPlacement::EnergyEmpty, 1_000_000, policy);
        assert_eq!(capped.reason, Some(AdFailure::DailyCapReached));
    }

    #[test]
    fn test_ad_provider_cap_resets_next_day() {
        let mut ads = SimulatedAdProvider::new(1);
        let policy = AdPolicy {
            cooldown_seconds: 0,
            daily_cap: 1,
        };
        let mut first_fill = false;
        for _ in 0..50 {
            if ads.watch(AdPlacement::EnergyEmpty, 1_000, policy).success {
                first_fill = true;
                break;
            }
        }
        assert!(first_fill);
        assert!(!ads.watch(AdPlacement::EnergyEmpty, 1_000, policy).success);

        let tomorrow = 1_000 + 24 * 60 * 60 * 1000;
        let mut filled = false;
        for _ in 0..20 {
            if ads.watch(AdPlacement::EnergyEmpty, tomorrow, policy).success {
                filled = true;
                break;
            }
        }
        assert!(filled);
    }

    #[test]
    fn test_ad_provider_cooldown() {
        let mut ads = SimulatedAdProvider::new(1);
        let policy = AdPolicy {
            cooldown_seconds: 60,
            daily_cap: 0,
        };
        // First request sets last_watch_at regardless of fill
        ads.watch(AdPlacement::EchoBonus, 1_000_000, policy);
        let blocked = ads.watch(AdPlacement::EchoBonus, 1_000_500, policy);
        assert_eq!(blocked.reason, Some(AdFailure::Cooldown));
    }

    #[test]
    fn test_purchase_provider_unknown_sku() {
        let mut purchases = SimulatedPurchaseProvider::new(vec!["starter_pack".to_string()]);
        let result = purchases.purchase("mystery_box");
        assert!(!result.success);
        assert_eq!(result.reason, Some(PurchaseFailure::UnknownSku));

        let ok = purchases.purchase("starter_pack");
        assert!(ok.success);
        assert_eq!(ok.transaction_id.as_deref(), Some("txn_sim_000001"));
    }

    #[test]
    fn test_analytics_ring_buffer_bounded() {
        let mut analytics = AnalyticsRecorder::new();
        for index in 0..250 {
            analytics.track("event", index, Value::Null);
        }
        assert_eq!(analytics.events().len(), MAX_ANALYTICS_EVENTS);
        assert_eq!(analytics.events()[0].at, 50);
    }
}
