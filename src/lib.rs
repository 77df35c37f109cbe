//! Slingshot Toss - drag-to-launch arcade toss over rolling hills
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, collectibles, toss state machine, scoring)
//! - `tuning`: Data-driven physics, spawn and scoring balance

pub mod sim;
pub mod tuning;

pub use tuning::{TossTuning, TuningError};

use glam::Vec2;

/// Fixed configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the native runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Hard cap on frames the native runner will simulate for one toss
    pub const MAX_RUN_FRAMES: u32 = 60 * 60 * 10;
}

/// Unit direction for an angle measured from +x, with +y pointing down
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Convert a 0..1 fraction into a value between `min` and `max`
#[inline]
pub fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

/// Damping multiplier that behaves the same at any frame rate.
///
/// `factor` is the per-frame multiplier at `frame_rate`; the result is the
/// multiplier for a step of `dt` seconds.
#[inline]
pub fn frame_independent_damping(factor: f32, dt: f32, frame_rate: f32) -> f32 {
    factor.powf(dt * frame_rate)
}
