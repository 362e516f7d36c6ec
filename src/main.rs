//! Headless demo session (default binary).
//!
//! Drives the simulation through a short scripted session: spawn from the
//! generators, auto-merge what lands, attempt the active orders, tick a
//! few frames and save. Re-running picks the save back up, so offline
//! energy catch-up is visible between runs.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use merge_manor::core::collab::{AlwaysConfirm, AnalyticsRecorder, SimulatedAdProvider, SimulatedPurchaseProvider};
use merge_manor::core::config::BundledConfigProvider;
use merge_manor::core::save::JsonFileStore;
use merge_manor::core::sim::{GameSimulation, SimulationDeps};
use merge_manor::core::{ContentRepository, SaveService};

fn main() -> Result<()> {
    env_logger::init();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);

    let content = ContentRepository::bundled();
    let known_skus = content
        .iap_catalog()
        .iter()
        .map(|sku| sku.id.to_string())
        .collect();
    let deps = SimulationDeps {
        content,
        config: Box::new(BundledConfigProvider::new()),
        save: SaveService::new(Box::new(JsonFileStore::new(".merge-manor-save"))),
        analytics: AnalyticsRecorder::new(),
        ads: Box::new(SimulatedAdProvider::new((now % u64::from(u32::MAX)) as u32)),
        purchases: Box::new(SimulatedPurchaseProvider::new(known_skus)),
        confirm: Box::new(AlwaysConfirm),
    };

    let mut sim = GameSimulation::new(deps, now)?;
    log::info!(
        "resumed at level {} with {} coins",
        sim.state().player.level,
        sim.state().player.coins
    );

    // Pull from every ready generator a few times
    for round in 0..6 {
        for generator_id in sim.ready_generator_ids(sim.state().now) {
            let outcome = sim.try_generator_spawn(&generator_id)?;
            log::debug!("round {round}: {generator_id} -> {outcome:?}");
        }
        sim.tick(now + (round + 1) * 16)?;
    }

    // Collapse anything mergeable on the board
    let item_types: BTreeSet<String> = sim
        .state()
        .items
        .values()
        .map(|item| item.item_id.clone())
        .collect();
    for item_type in item_types {
        sim.auto_merge_by_double_tap(&item_type)?;
    }

    // Attempt every active order
    for slot in 0..sim.state().orders_active.len() {
        if sim.try_complete_order(slot)? {
            log::info!("completed order in slot {slot}");
        }
    }

    sim.tick_guarded(now + 1_000);
    sim.save_now();

    let state = sim.state();
    println!(
        "level {} | {} coins | {} stars | {}/{} energy | {} items | {} letters",
        state.player.level,
        state.player.coins,
        state.player.stars,
        state.energy.current,
        state.energy.max,
        state.items.len(),
        state.letters.len(),
    );
    for toast in &state.ui.toasts {
        println!("  - {}", toast.text);
    }
    Ok(())
}
