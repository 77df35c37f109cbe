//! Data-driven game balance
//!
//! Every physics, spawn and scoring constant the simulation reads lives in
//! [`TossTuning`]. A tuning is an immutable value handed to the simulation at
//! construction, so differently tuned simulations can run side by side.
//! Tunings load from JSON; any field left out keeps its default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::CollectibleKind;

/// Free-flight and ground-contact physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward acceleration (units/s², +y is down)
    pub gravity: f32,
    /// Launch speed at zero pull
    pub min_power: f32,
    /// Launch speed at full pull
    pub max_power: f32,
    /// Per-frame velocity multiplier while flying
    pub air_resistance: f32,
    /// Per-frame velocity multiplier while surfing
    pub ground_friction: f32,
    /// Frame rate the two multipliers above are expressed at
    pub reference_frame_rate: f32,
    /// Extra downward acceleration while diving in the air
    pub air_dive_accel: f32,
    /// Extra downward acceleration while diving on the ground
    pub surf_dive_accel: f32,
    /// Fraction of gravity applied while surfing
    pub surf_gravity_scale: f32,
    /// Along-slope acceleration at a vertical slope
    pub slope_force: f32,
    /// Fraction of speed kept when landing
    pub landing_restitution: f32,
    /// Slope angle (radians) below which an uphill run launches off
    pub launch_off_slope: f32,
    /// Minimum horizontal speed for a launch-off
    pub launch_off_min_speed: f32,
    /// Launch-off lift as a fraction of horizontal speed
    pub launch_off_lift: f32,
    /// Constant lift added on launch-off
    pub launch_off_lift_bias: f32,
    /// Horizontal speed kept on launch-off
    pub launch_off_keep: f32,
    /// Total speed below which a surfing run stops at once
    pub stop_speed: f32,
    /// Horizontal speed below which the slow timer runs
    pub slow_speed: f32,
    /// Seconds of slow crawling before the run stops
    pub slow_duration: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 600.0,
            min_power: 800.0,
            max_power: 2500.0,
            air_resistance: 0.9995,
            ground_friction: 0.995,
            reference_frame_rate: 60.0,
            air_dive_accel: 3000.0,
            surf_dive_accel: 2500.0,
            surf_gravity_scale: 0.6,
            slope_force: 1500.0,
            landing_restitution: 0.8,
            launch_off_slope: -0.25,
            launch_off_min_speed: 300.0,
            launch_off_lift: 0.7,
            launch_off_lift_bias: 200.0,
            launch_off_keep: 0.9,
            stop_speed: 80.0,
            slow_speed: 120.0,
            slow_duration: 0.15,
        }
    }
}

/// Drag-to-launch handling and the aim preview arc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimTuning {
    /// Drag length that maps to full power
    pub max_drag: f32,
    /// Releases shorter than this cancel the throw
    pub cancel_threshold: f32,
    /// Most upward launch angle (radians, negative is up)
    pub min_angle: f32,
    /// Most downward launch angle
    pub max_angle: f32,
    /// Drags shorter than this draw no preview
    pub preview_threshold: f32,
    /// Launch velocity scale used by the preview arc
    pub preview_scale: f32,
    pub preview_steps: u32,
    /// Seconds per preview sample
    pub preview_step: f32,
}

impl Default for AimTuning {
    fn default() -> Self {
        Self {
            max_drag: 150.0,
            cancel_threshold: 25.0,
            min_angle: -1.31, // ~75 degrees up
            max_angle: 0.52,  // ~30 degrees down
            preview_threshold: 15.0,
            preview_scale: 0.4,
            preview_steps: 50,
            preview_step: 0.04,
        }
    }
}

/// One sine layer of the ground profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillLayer {
    pub frequency: f32,
    pub amplitude: f32,
}

/// Ground profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Flat ground line the hills are subtracted from
    pub ground_y: f32,
    /// World x that maps to phase zero of every layer
    pub origin_x: f32,
    pub layers: [HillLayer; 4],
    /// Half-width of the central difference used for slope
    pub slope_probe: f32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            ground_y: 900.0,
            origin_x: 0.0,
            layers: [
                // Big rolling hills
                HillLayer { frequency: 0.002, amplitude: 180.0 },
                // Medium hills
                HillLayer { frequency: 0.005, amplitude: 100.0 },
                // Small bumps
                HillLayer { frequency: 0.015, amplitude: 40.0 },
                // Very large waves
                HillLayer { frequency: 0.001, amplitude: 120.0 },
            ],
            slope_probe: 5.0,
        }
    }
}

impl TerrainTuning {
    /// Perfectly level ground at `ground_y`
    pub fn flat(ground_y: f32) -> Self {
        Self {
            ground_y,
            layers: [HillLayer { frequency: 0.0, amplitude: 0.0 }; 4],
            ..Self::default()
        }
    }
}

/// Vertical placement of a spawned item relative to the ground at its x
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Placement {
    /// `offset` above ground plus up to `spread` more
    Sky { offset: f32, spread: f32 },
    /// Fixed `offset` above ground
    Ground { offset: f32 },
}

/// One independent roll made at every spawn step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub kind: CollectibleKind,
    /// Chance per spawn step
    pub probability: f32,
    pub placement: Placement,
    /// Distance from the launch point before this rule may fire
    #[serde(default)]
    pub min_distance: f32,
    /// Distance into each freshly spawned band before this rule may fire
    #[serde(default)]
    pub band_lead_in: f32,
}

impl SpawnRule {
    fn sky(kind: CollectibleKind, probability: f32, offset: f32, spread: f32) -> Self {
        Self {
            kind,
            probability,
            placement: Placement::Sky { offset, spread },
            min_distance: 0.0,
            band_lead_in: 0.0,
        }
    }

    fn ground(kind: CollectibleKind, probability: f32, offset: f32) -> Self {
        Self {
            kind,
            probability,
            placement: Placement::Ground { offset },
            min_distance: 0.0,
            band_lead_in: 0.0,
        }
    }
}

/// Collectible streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// x distance between spawn rolls
    pub step: f32,
    /// No items closer than this to the launch point
    pub first_spawn_lead: f32,
    /// Frontier generated before launch
    pub initial_horizon: f32,
    /// Extend once the projectile is this close to the frontier
    pub refill_margin: f32,
    /// How far each extension pushes the frontier
    pub refill_chunk: f32,
    /// Items farther than this horizontally skip the exact overlap test
    pub query_cutoff: f32,
    /// Items this far behind the projectile are evicted
    pub evict_buffer: f32,
    /// Progress between eviction passes
    pub evict_interval: f32,
    pub rules: Vec<SpawnRule>,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        use CollectibleKind::*;

        Self {
            step: 40.0,
            first_spawn_lead: 300.0,
            initial_horizon: 5000.0,
            refill_margin: 2000.0,
            refill_chunk: 5000.0,
            query_cutoff: 500.0,
            evict_buffer: 2000.0,
            evict_interval: 1000.0,
            rules: vec![
                SpawnRule::sky(Star, 0.04, 150.0, 3500.0),
                SpawnRule::sky(Star, 0.025, 1500.0, 2500.0),
                SpawnRule::sky(Rocket, 0.015, 200.0, 2000.0),
                SpawnRule::sky(Rocket, 0.01, 1500.0, 2000.0),
                SpawnRule::ground(Star, 0.02, 50.0),
                SpawnRule {
                    band_lead_in: 500.0,
                    ..SpawnRule::ground(Bomb, 0.004, 30.0)
                },
                SpawnRule::sky(Chips, 0.03, 100.0, 1500.0),
                SpawnRule::sky(Popcorn, 0.04, 80.0, 1000.0),
                SpawnRule {
                    min_distance: 3000.0,
                    ..SpawnRule::ground(Barrier, 0.008, 60.0)
                },
                SpawnRule::ground(BouncePad, 0.01, 40.0),
            ],
        }
    }
}

/// Velocity changes applied on collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    pub bounce_lift: f32,
    pub bounce_speedup: f32,
    pub rocket_push: f32,
    pub rocket_lift: f32,
    pub bomb_push: f32,
    /// Vertical velocity set by a bomb (negative is up)
    pub bomb_vy: f32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            bounce_lift: 800.0,
            bounce_speedup: 1.1,
            rocket_push: 600.0,
            rocket_lift: 200.0,
            bomb_push: 400.0,
            bomb_vy: -1200.0,
        }
    }
}

/// Score multipliers and per-item points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Points per unit distance
    pub distance_multiplier: f32,
    /// Points per second of air time
    pub air_time_multiplier: f32,
    /// Points per unit of max height
    pub height_multiplier: f32,
    pub star_points: u64,
    pub rocket_points: u64,
    pub bomb_points: u64,
    pub bounce_pad_points: u64,
    pub chips_points: u64,
    pub popcorn_points: u64,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            distance_multiplier: 0.5,
            air_time_multiplier: 10.0,
            height_multiplier: 0.1,
            star_points: 500,
            rocket_points: 200,
            bomb_points: 1000,
            bounce_pad_points: 100,
            chips_points: 300,
            popcorn_points: 150,
        }
    }
}

impl ScoringTuning {
    /// Points awarded per collected item of `kind` (barriers score nothing)
    pub fn points_for(&self, kind: CollectibleKind) -> u64 {
        match kind {
            CollectibleKind::BouncePad => self.bounce_pad_points,
            CollectibleKind::Rocket => self.rocket_points,
            CollectibleKind::Star => self.star_points,
            CollectibleKind::Bomb => self.bomb_points,
            CollectibleKind::Chips => self.chips_points,
            CollectibleKind::Popcorn => self.popcorn_points,
            CollectibleKind::Barrier => 0,
        }
    }
}

/// Launch anchor and projectile size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub start_x: f32,
    pub start_y: f32,
    pub projectile_radius: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            start_x: 360.0,
            start_y: 380.0,
            projectile_radius: 45.0,
        }
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TossTuning {
    pub physics: PhysicsTuning,
    pub aim: AimTuning,
    pub terrain: TerrainTuning,
    pub spawn: SpawnTuning,
    pub effects: EffectTuning,
    pub scoring: ScoringTuning,
    pub world: WorldTuning,
}

/// Why a tuning was rejected
#[derive(Debug)]
pub enum TuningError {
    /// JSON could not be parsed
    Parse(serde_json::Error),
    /// A value is NaN or infinite
    NonFinite { field: &'static str },
    /// A value must be strictly positive
    NonPositive { field: &'static str, value: f32 },
    /// A lower bound exceeds its upper bound
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    /// A spawn probability outside [0, 1]
    Probability { rule: usize, value: f32 },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "tuning JSON is malformed: {e}"),
            Self::NonFinite { field } => write!(f, "{field} must be finite"),
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            Self::InvertedRange { field, min, max } => {
                write!(f, "{field} range is inverted ({min} > {max})")
            }
            Self::Probability { rule, value } => {
                write!(f, "spawn rule {rule} probability {value} is outside [0, 1]")
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NonPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
    finite(field, min)?;
    finite(field, max)?;
    if min <= max {
        Ok(())
    } else {
        Err(TuningError::InvertedRange { field, min, max })
    }
}

impl TossTuning {
    /// Parse a (possibly partial) JSON tuning and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON (the same shape `from_json` reads)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.physics;
        finite("physics.gravity", p.gravity)?;
        ordered("physics.power", p.min_power, p.max_power)?;
        positive("physics.air_resistance", p.air_resistance)?;
        positive("physics.ground_friction", p.ground_friction)?;
        positive("physics.reference_frame_rate", p.reference_frame_rate)?;
        finite("physics.air_dive_accel", p.air_dive_accel)?;
        finite("physics.surf_dive_accel", p.surf_dive_accel)?;
        finite("physics.surf_gravity_scale", p.surf_gravity_scale)?;
        finite("physics.slope_force", p.slope_force)?;
        finite("physics.landing_restitution", p.landing_restitution)?;
        finite("physics.launch_off_slope", p.launch_off_slope)?;
        finite("physics.launch_off_min_speed", p.launch_off_min_speed)?;
        finite("physics.launch_off_lift", p.launch_off_lift)?;
        finite("physics.launch_off_lift_bias", p.launch_off_lift_bias)?;
        finite("physics.launch_off_keep", p.launch_off_keep)?;
        ordered("physics.stop_speed", p.stop_speed, p.slow_speed)?;
        finite("physics.slow_duration", p.slow_duration)?;

        let a = &self.aim;
        positive("aim.max_drag", a.max_drag)?;
        finite("aim.cancel_threshold", a.cancel_threshold)?;
        ordered("aim.angle", a.min_angle, a.max_angle)?;
        finite("aim.preview_threshold", a.preview_threshold)?;
        finite("aim.preview_scale", a.preview_scale)?;
        positive("aim.preview_step", a.preview_step)?;

        let t = &self.terrain;
        finite("terrain.ground_y", t.ground_y)?;
        finite("terrain.origin_x", t.origin_x)?;
        for layer in &t.layers {
            finite("terrain.layers.frequency", layer.frequency)?;
            finite("terrain.layers.amplitude", layer.amplitude)?;
        }
        positive("terrain.slope_probe", t.slope_probe)?;

        let s = &self.spawn;
        positive("spawn.step", s.step)?;
        finite("spawn.first_spawn_lead", s.first_spawn_lead)?;
        finite("spawn.initial_horizon", s.initial_horizon)?;
        finite("spawn.refill_margin", s.refill_margin)?;
        positive("spawn.refill_chunk", s.refill_chunk)?;
        positive("spawn.query_cutoff", s.query_cutoff)?;
        finite("spawn.evict_buffer", s.evict_buffer)?;
        positive("spawn.evict_interval", s.evict_interval)?;
        for (i, rule) in s.rules.iter().enumerate() {
            if !(0.0..=1.0).contains(&rule.probability) {
                return Err(TuningError::Probability {
                    rule: i,
                    value: rule.probability,
                });
            }
            match rule.placement {
                Placement::Sky { offset, spread } => {
                    finite("spawn.rules.offset", offset)?;
                    finite("spawn.rules.spread", spread)?;
                }
                Placement::Ground { offset } => finite("spawn.rules.offset", offset)?,
            }
            finite("spawn.rules.min_distance", rule.min_distance)?;
            finite("spawn.rules.band_lead_in", rule.band_lead_in)?;
        }

        let e = &self.effects;
        finite("effects.bounce_lift", e.bounce_lift)?;
        finite("effects.bounce_speedup", e.bounce_speedup)?;
        finite("effects.rocket_push", e.rocket_push)?;
        finite("effects.rocket_lift", e.rocket_lift)?;
        finite("effects.bomb_push", e.bomb_push)?;
        finite("effects.bomb_vy", e.bomb_vy)?;

        let sc = &self.scoring;
        finite("scoring.distance_multiplier", sc.distance_multiplier)?;
        finite("scoring.air_time_multiplier", sc.air_time_multiplier)?;
        finite("scoring.height_multiplier", sc.height_multiplier)?;

        let w = &self.world;
        finite("world.start_x", w.start_x)?;
        finite("world.start_y", w.start_y)?;
        positive("world.projectile_radius", w.projectile_radius)?;

        Ok(())
    }
}
