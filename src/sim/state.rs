//! Toss state and core simulation types
//!
//! `TossState` owns everything one run mutates: the projectile, run stats,
//! collectible field and the event queue read by the presentation layer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aim::{self, Drag};
use super::collectible::{CollectibleField, CollectibleKind};
use super::scoring::{RunStats, TossResult, score_run};
use super::terrain::Terrain;
use crate::tuning::TossTuning;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Total speed fell under the stop floor
    Stalled,
    /// Horizontal speed stayed low past the slow duration
    Crawled,
    /// Ran into a barrier
    Blocked,
}

/// Current phase of a toss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TossPhase {
    /// Waiting for a drag to begin
    Ready,
    /// Drag in progress; `drag` is the latest pointer sample
    Aiming { drag: Option<Drag> },
    /// Free flight
    Flying,
    /// Sliding along the ground; `slow_time` is seconds spent crawling
    Surfing { slow_time: f32 },
    /// Run over; nothing moves again
    Stopped { reason: StopReason },
}

impl TossPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TossPhase::Ready => "ready",
            TossPhase::Aiming { .. } => "aiming",
            TossPhase::Flying => "flying",
            TossPhase::Surfing { .. } => "surfing",
            TossPhase::Stopped { .. } => "stopped",
        }
    }

    /// Flying or surfing
    pub fn is_moving(&self) -> bool {
        matches!(self, TossPhase::Flying | TossPhase::Surfing { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TossPhase::Stopped { .. })
    }
}

/// The tossed projectile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Projectile {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// What happened, for transient visual feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TossEventKind {
    Launched,
    /// Touched down and started surfing
    Landed,
    /// Left a steep uphill with enough speed
    LaunchOff,
    Collected(CollectibleKind),
    Stopped(StopReason),
}

/// Timestamped pulse emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TossEvent {
    pub kind: TossEventKind,
    pub pos: Vec2,
    /// Simulation clock in milliseconds
    pub time_ms: f64,
}

/// Complete toss state (deterministic for a given seed, tuning and inputs)
#[derive(Debug, Clone)]
pub struct TossState {
    /// Seed of the current run's collectible layout
    pub(crate) seed: u64,
    pub(crate) tuning: TossTuning,
    pub(crate) terrain: Terrain,
    pub(crate) field: CollectibleField,
    pub(crate) projectile: Projectile,
    pub(crate) phase: TossPhase,
    pub(crate) stats: RunStats,
    /// Simulation clock (ms since the run was created)
    pub(crate) time_ms: f64,
    /// Projectile x at the last eviction pass
    pub(crate) last_evict_x: f32,
    pub(crate) events: Vec<TossEvent>,
    pub(crate) result: Option<TossResult>,
    pub(crate) result_taken: bool,
}

impl TossState {
    /// Create a run in `Ready` with the given tuning and layout seed
    pub fn new(tuning: TossTuning, seed: u64) -> Self {
        let terrain = Terrain::new(&tuning.terrain);
        let start = Vec2::new(tuning.world.start_x, tuning.world.start_y);
        let mut field = CollectibleField::new(tuning.spawn.clone(), start.x, seed);
        field.spawn_ahead(start.x + tuning.spawn.initial_horizon, &terrain);

        log::info!(
            "New toss with seed {}: {} collectibles up to x={:.0}",
            seed,
            field.len(),
            field.frontier()
        );

        Self {
            seed,
            projectile: Projectile::new(start, tuning.world.projectile_radius),
            tuning,
            terrain,
            field,
            phase: TossPhase::Ready,
            stats: RunStats::default(),
            time_ms: 0.0,
            last_evict_x: start.x,
            events: Vec::new(),
            result: None,
            result_taken: false,
        }
    }

    /// Start over from `Ready` with a fresh layout, keeping the tuning
    pub fn new_run(&mut self, seed: u64) {
        let tuning = std::mem::take(&mut self.tuning);
        *self = Self::new(tuning, seed);
    }

    /// Seed of the current run's collectible layout
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &TossTuning {
        &self.tuning
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn collectibles(&self) -> &CollectibleField {
        &self.field
    }

    pub fn projectile(&self) -> &Projectile {
        &self.projectile
    }

    pub fn phase(&self) -> TossPhase {
        self.phase
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Distance travelled past the launch point (never negative)
    pub fn distance(&self) -> f32 {
        (self.projectile.pos.x - self.tuning.world.start_x).max(0.0)
    }

    /// Clearance between the ground and the projectile center
    pub fn height_above_ground(&self) -> f32 {
        self.terrain.height(self.projectile.pos.x) - self.projectile.pos.y
    }

    /// Power meter fill while aiming (0..1)
    pub fn aim_power(&self) -> Option<f32> {
        match self.phase {
            TossPhase::Aiming { drag: Some(drag) } => {
                Some(aim::power_fraction(drag.length(), self.tuning.aim.max_drag))
            }
            _ => None,
        }
    }

    /// Dotted aim arc for the current drag
    pub fn aim_preview(&self) -> Vec<Vec2> {
        match self.phase {
            TossPhase::Aiming { drag: Some(drag) } => aim::preview_trajectory(
                self.projectile.pos,
                &drag,
                &self.terrain,
                &self.tuning.aim,
                &self.tuning.physics,
            ),
            _ => Vec::new(),
        }
    }

    /// Hand pending events to the presentation layer
    pub fn drain_events(&mut self) -> Vec<TossEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending events without consuming them
    pub fn events(&self) -> &[TossEvent] {
        &self.events
    }

    /// Final result, if the run is over
    pub fn result(&self) -> Option<&TossResult> {
        self.result.as_ref()
    }

    /// Final result, handed out once; later calls return `None`
    pub fn take_result(&mut self) -> Option<TossResult> {
        if self.result_taken {
            return None;
        }
        let result = self.result?;
        self.result_taken = true;
        Some(result)
    }

    pub(crate) fn emit(&mut self, kind: TossEventKind) {
        self.events.push(TossEvent {
            kind,
            pos: self.projectile.pos,
            time_ms: self.time_ms,
        });
    }

    pub(crate) fn set_phase(&mut self, phase: TossPhase) {
        if std::mem::discriminant(&self.phase) != std::mem::discriminant(&phase) {
            log::debug!(
                "{} -> {} at x={:.0}",
                self.phase.name(),
                phase.name(),
                self.projectile.pos.x
            );
        }
        self.phase = phase;
    }

    /// Freeze the run and compute its result
    pub(crate) fn stop(&mut self, reason: StopReason) {
        debug_assert!(!self.phase.is_stopped(), "run stopped twice");
        self.set_phase(TossPhase::Stopped { reason });
        let result = score_run(&self.stats, &self.tuning.scoring);
        log::info!(
            "Toss over ({:?}): {}m, {:.1}s, score {}",
            reason,
            result.distance,
            result.air_time,
            result.score
        );
        self.result = Some(result);
        self.emit(TossEventKind::Stopped(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_ready_at_start() {
        let state = TossState::new(TossTuning::default(), 1);
        assert_eq!(state.phase(), TossPhase::Ready);
        assert_eq!(state.projectile().pos, Vec2::new(360.0, 380.0));
        assert_eq!(state.projectile().vel, Vec2::ZERO);
        assert_eq!(state.projectile().radius, 45.0);
        assert_eq!(state.collectibles().frontier(), 5360.0);
        assert!(state.result().is_none());
    }

    #[test]
    fn test_start_is_above_ground() {
        let state = TossState::new(TossTuning::default(), 1);
        assert!(state.height_above_ground() > state.projectile().radius);
    }

    #[test]
    fn test_new_run_resets_and_reseeds() {
        let mut state = TossState::new(TossTuning::default(), 1);
        state.projectile.pos.x = 4000.0;
        state.stats.max_distance = 3900.0;
        state.stop(StopReason::Stalled);

        state.new_run(2);
        assert_eq!(state.seed(), 2);
        assert_eq!(state.phase(), TossPhase::Ready);
        assert_eq!(state.stats(), &RunStats::default());
        assert!(state.result().is_none());
        assert!(state.events().is_empty());
        assert_eq!(state.tuning(), &TossTuning::default());
    }

    #[test]
    fn test_result_taken_once() {
        let mut state = TossState::new(TossTuning::default(), 1);
        assert!(state.take_result().is_none());
        state.stop(StopReason::Blocked);
        assert!(state.take_result().is_some());
        assert!(state.take_result().is_none());
        assert!(state.result().is_some());
        assert_eq!(
            state.drain_events().last().map(|e| e.kind),
            Some(TossEventKind::Stopped(StopReason::Blocked))
        );
    }

    #[test]
    fn test_aim_power_only_while_aiming() {
        let mut state = TossState::new(TossTuning::default(), 1);
        assert!(state.aim_power().is_none());
        state.phase = TossPhase::Aiming {
            drag: Some(Drag::new(Vec2::ZERO, Vec2::new(-75.0, 0.0))),
        };
        assert_eq!(state.aim_power(), Some(0.5));
        assert!(!state.aim_preview().is_empty());
    }
}
