//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Tuning passed in, no global constants read at run time
//! - Seeded RNG only
//! - Stable iteration order (collectibles kept in x order)
//! - No rendering or platform dependencies

pub mod aim;
pub mod collectible;
pub mod scoring;
pub mod state;
pub mod terrain;
pub mod tick;

pub use aim::{Drag, Launch, preview_trajectory, resolve_launch};
pub use collectible::{Collectible, CollectibleField, CollectibleKind};
pub use scoring::{CollectCounts, RunStats, TossResult, calculate_score, score_run};
pub use state::{Projectile, StopReason, TossEvent, TossEventKind, TossPhase, TossState};
pub use terrain::Terrain;
pub use tick::{TickInput, tick};
