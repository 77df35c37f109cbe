//! Slingshot aiming
//!
//! The launch direction points from the drag end back to the drag start,
//! like pulling back a slingshot. Power grows with drag length up to
//! `max_drag`. The angle is clamped into a forward window, so a drag aimed
//! backward or straight down still launches, at the nearest legal angle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::terrain::Terrain;
use crate::direction_from_angle;
use crate::tuning::{AimTuning, PhysicsTuning};

/// A drag gesture from `start` to `end` (screen units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drag {
    pub start: Vec2,
    pub end: Vec2,
}

impl Drag {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Pull vector: from the release point back toward the anchor
    #[inline]
    pub fn pull(&self) -> Vec2 {
        self.start - self.end
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.pull().length()
    }
}

/// Resolved launch parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    /// 0..1 share of the power range
    pub power_fraction: f32,
    /// Launch speed
    pub power: f32,
    /// Clamped launch angle (radians, negative is up)
    pub angle: f32,
}

impl Launch {
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        direction_from_angle(self.angle) * self.power
    }
}

/// Share of full power for a drag length; zero for degenerate input
#[inline]
pub fn power_fraction(drag_distance: f32, max_drag: f32) -> f32 {
    if max_drag.is_nan() || max_drag <= 0.0 || !drag_distance.is_finite() {
        return 0.0;
    }
    (drag_distance / max_drag).clamp(0.0, 1.0)
}

/// Raw slingshot angle of a drag, before clamping
#[inline]
pub fn drag_angle(drag: &Drag) -> f32 {
    let pull = drag.pull();
    pull.y.atan2(pull.x)
}

/// Resolve a drag release into a launch.
///
/// Returns `None` when the drag is shorter than the cancel threshold.
pub fn resolve_launch(drag: &Drag, aim: &AimTuning, physics: &PhysicsTuning) -> Option<Launch> {
    let distance = drag.length();
    if !distance.is_finite() || distance < aim.cancel_threshold {
        return None;
    }
    let power_fraction = power_fraction(distance, aim.max_drag);
    let power = crate::lerp(physics.min_power, physics.max_power, power_fraction);
    let angle = drag_angle(drag).clamp(aim.min_angle, aim.max_angle);
    Some(Launch {
        power_fraction,
        power,
        angle,
    })
}

/// Sample points of the dotted aim arc shown while dragging.
///
/// Uses a scaled-down launch velocity and gravity only; stops at the first
/// sample below ground. Empty for drags under the preview threshold.
pub fn preview_trajectory(
    origin: Vec2,
    drag: &Drag,
    terrain: &Terrain,
    aim: &AimTuning,
    physics: &PhysicsTuning,
) -> Vec<Vec2> {
    let distance = drag.length();
    if distance <= aim.preview_threshold {
        return Vec::new();
    }
    let power = crate::lerp(
        physics.min_power,
        physics.max_power,
        power_fraction(distance, aim.max_drag),
    );
    let angle = drag_angle(drag).clamp(aim.min_angle, aim.max_angle);

    let mut pos = origin;
    let mut vel = direction_from_angle(angle) * power * aim.preview_scale;
    let mut points = Vec::with_capacity(aim.preview_steps as usize + 1);
    points.push(pos);
    for _ in 0..aim.preview_steps {
        pos += vel * aim.preview_step;
        vel.y += physics.gravity * aim.preview_step;
        points.push(pos);
        if pos.y > terrain.height(pos.x) {
            break;
        }
    }
    points
}
