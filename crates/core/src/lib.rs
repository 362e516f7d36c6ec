//! Core simulation logic - pure, deterministic, and testable
//!
//! This crate contains all the game rules and state management for the
//! merge-board game. It has **zero dependencies** on rendering, input or
//! networking, making it:
//!
//! - **Deterministic**: seed plus timestamps reproduce an identical
//!   session; the RNG state is persisted so saves continue the sequence
//! - **Testable**: every rule is exercised without a host loop
//! - **Portable**: runs headless, in a canvas host, or under a test
//!   harness unchanged
//!
//! # Module Structure
//!
//! - [`rng`]: one seeded generator for drops, order draws and echo rolls
//! - [`clock`]: day/week bucketing behind the daily and weekly resets
//! - [`layout`]: slot-index <-> rectangle math and pointer hit testing
//! - [`content`] / [`catalog`]: validated immutable content tables
//! - [`config`]: runtime-tunable parameters with a refresh fallback
//! - [`store`]: commit-and-notify state container
//! - [`save`]: versioned save schema with an explicit migration chain
//! - [`collab`]: injected collaborator contracts (ads, purchases,
//!   confirmation, analytics, id generation)
//! - [`state`]: the authoritative [`state::GameState`] snapshot
//! - [`sim`]: [`sim::GameSimulation`] - every mutation and the frame tick
//!
//! # Example
//!
//! ```
//! use merge_manor_core::sim::{GameSimulation, SimulationDeps};
//!
//! let mut sim = GameSimulation::new(SimulationDeps::simulated(7), 1_000_000).unwrap();
//! let spawn = sim.try_generator_spawn("toolbox").unwrap();
//! assert!(spawn.ok());
//! sim.tick(1_016_000).unwrap();
//! ```

pub mod catalog;
pub mod clock;
pub mod collab;
pub mod config;
pub mod content;
pub mod layout;
pub mod rng;
pub mod save;
pub mod sim;
pub mod state;
pub mod store;

pub use config::{ConfigProvider, GameConfig};
pub use content::{ContentError, ContentRepository};
pub use rng::DeterministicRng;
pub use save::{SaveData, SaveService};
pub use sim::{GameSimulation, SimulationDeps, SimulationError};
pub use state::GameState;
pub use store::Store;
