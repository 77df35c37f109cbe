//! Per-frame simulation tick
//!
//! Advances the toss state machine by one host frame:
//! `Ready -> Aiming -> Flying <-> Surfing -> Stopped`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aim::{Drag, resolve_launch};
use super::collectible::CollectibleKind;
use super::state::{StopReason, TossEvent, TossEventKind, TossPhase, TossState};
use crate::frame_independent_damping;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Pointer went down (starts or restarts aiming)
    pub drag_began: bool,
    /// Latest in-progress drag sample while aiming
    pub aim: Option<Drag>,
    /// Pointer released with the full drag
    pub drag_ended: Option<Drag>,
    /// Dive is being held
    pub dive: bool,
}

impl TickInput {
    pub fn begin() -> Self {
        Self {
            drag_began: true,
            ..Default::default()
        }
    }

    pub fn release(drag: Drag) -> Self {
        Self {
            drag_ended: Some(drag),
            ..Default::default()
        }
    }

    pub fn dive(held: bool) -> Self {
        Self {
            dive: held,
            ..Default::default()
        }
    }
}

/// Advance the toss by `dt` seconds.
///
/// A stopped run is frozen. Ticking it is a host bug: debug builds panic,
/// release builds return without touching anything. Hosts should stop
/// calling `update` once `take_result` yields, or start a `new_run`.
pub fn tick(state: &mut TossState, input: &TickInput, dt: f32) {
    debug_assert!(!state.phase.is_stopped(), "tick after stop");
    if state.phase.is_stopped() {
        return;
    }
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }
    state.time_ms += dt as f64 * 1000.0;

    match state.phase {
        TossPhase::Ready | TossPhase::Aiming { .. } => handle_aim(state, input),
        TossPhase::Flying => step_flying(state, input.dive, dt),
        TossPhase::Surfing { .. } => step_surfing(state, input.dive, dt),
        TossPhase::Stopped { .. } => unreachable!("stopped runs return above"),
    }

    if state.phase.is_moving() {
        extend_world(state);
    }
}

impl TossState {
    /// Advance one host frame (see [`tick`])
    pub fn update(&mut self, input: &TickInput, dt: f32) {
        tick(self, input, dt);
    }
}

fn handle_aim(state: &mut TossState, input: &TickInput) {
    if input.drag_began {
        state.set_phase(TossPhase::Aiming { drag: None });
    }

    let TossPhase::Aiming { drag } = state.phase else {
        return;
    };
    if let Some(sample) = input.aim {
        state.phase = TossPhase::Aiming { drag: Some(sample) };
    } else {
        state.phase = TossPhase::Aiming { drag };
    }

    let Some(release) = input.drag_ended else {
        return;
    };
    match resolve_launch(&release, &state.tuning.aim, &state.tuning.physics) {
        None => {
            log::debug!("Drag of {:.1} too short, throw cancelled", release.length());
            state.set_phase(TossPhase::Ready);
        }
        Some(launch) => {
            state.projectile.vel = launch.velocity();
            state.set_phase(TossPhase::Flying);
            log::info!(
                "Launched at {:.0}% power ({:.0}), angle {:.2} rad",
                launch.power_fraction * 100.0,
                launch.power,
                launch.angle
            );
            state.emit(TossEventKind::Launched);
        }
    }
}

fn step_flying(state: &mut TossState, dive: bool, dt: f32) {
    debug_assert!(matches!(state.phase, TossPhase::Flying));
    let physics = state.tuning.physics.clone();
    state.stats.add_time(dt);

    let vel = &mut state.projectile.vel;
    vel.y += physics.gravity * dt;
    if dive {
        vel.y += physics.air_dive_accel * dt;
    }
    *vel *= frame_independent_damping(physics.air_resistance, dt, physics.reference_frame_rate);
    state.projectile.pos += state.projectile.vel * dt;
    observe(state);

    resolve_collisions(state);
    if state.phase.is_stopped() {
        return;
    }

    // Ground contact: clamp and carry speed along the slope
    let p = &mut state.projectile;
    let floor = state.terrain.height(p.pos.x) - p.radius;
    if matches!(state.phase, TossPhase::Flying) && p.pos.y >= floor {
        p.pos.y = floor;
        let speed = p.vel.length();
        p.vel = state.terrain.tangent(p.pos.x) * speed * physics.landing_restitution;
        state.set_phase(TossPhase::Surfing { slow_time: 0.0 });
        state.emit(TossEventKind::Landed);
    }
}

fn step_surfing(state: &mut TossState, dive: bool, dt: f32) {
    debug_assert!(matches!(state.phase, TossPhase::Surfing { .. }));
    let TossPhase::Surfing { slow_time } = state.phase else {
        return;
    };
    let physics = state.tuning.physics.clone();
    state.stats.add_time(dt);

    let ground_angle = state.terrain.slope(state.projectile.pos.x);
    let vel = &mut state.projectile.vel;
    vel.y += physics.gravity * physics.surf_gravity_scale * dt;
    if dive {
        vel.y += physics.surf_dive_accel * dt;
    }
    vel.x += ground_angle.sin() * physics.slope_force * dt;
    *vel *= frame_independent_damping(physics.ground_friction, dt, physics.reference_frame_rate);
    state.projectile.pos += state.projectile.vel * dt;

    let p = &mut state.projectile;
    let floor = state.terrain.height(p.pos.x) - p.radius;
    if p.pos.y >= floor {
        p.pos.y = floor;
        let speed = p.vel.x.abs();
        if ground_angle < physics.launch_off_slope && speed > physics.launch_off_min_speed {
            p.vel.y = -speed * physics.launch_off_lift - physics.launch_off_lift_bias;
            p.vel.x *= physics.launch_off_keep;
            log::debug!("Launch-off at x={:.0}, vy={:.0}", p.pos.x, p.vel.y);
            state.set_phase(TossPhase::Flying);
            state.emit(TossEventKind::LaunchOff);
        }
    } else {
        // Ground fell away
        state.set_phase(TossPhase::Flying);
    }
    observe(state);

    resolve_collisions(state);

    if !matches!(state.phase, TossPhase::Surfing { .. }) {
        return;
    }
    let vel = state.projectile.vel;
    if vel.length() < physics.stop_speed {
        state.stop(StopReason::Stalled);
    } else if vel.x.abs() < physics.slow_speed {
        let slow_time = slow_time + dt;
        if slow_time > physics.slow_duration {
            state.stop(StopReason::Crawled);
        } else {
            state.phase = TossPhase::Surfing { slow_time };
        }
    } else {
        state.phase = TossPhase::Surfing { slow_time: 0.0 };
    }
}

/// Fold the projectile's position into the run stats
fn observe(state: &mut TossState) {
    let distance = state.distance();
    let height = state.height_above_ground();
    state.stats.observe(distance, height);
}

/// Collect everything the projectile overlaps and apply each effect once
fn resolve_collisions(state: &mut TossState) {
    let hits = state
        .collectibles()
        .query_near(state.projectile.pos, state.projectile.radius);
    for index in hits {
        let Some((kind, pos)) = state.field.collect(index) else {
            continue;
        };
        apply_effect(state, kind, pos);
        if state.phase.is_stopped() {
            // Barrier: the rest of this tick's hits are ignored
            break;
        }
    }
}

fn apply_effect(state: &mut TossState, kind: CollectibleKind, item_pos: Vec2) {
    debug_assert!(!state.phase.is_stopped(), "effect applied after stop");
    log::trace!("Collected {:?} at ({:.0}, {:.0})", kind, item_pos.x, item_pos.y);

    state.stats.counts.record(kind);
    state.events.push(TossEvent {
        kind: TossEventKind::Collected(kind),
        pos: item_pos,
        time_ms: state.time_ms,
    });

    let effects = &state.tuning.effects;
    let vel = &mut state.projectile.vel;
    match kind {
        CollectibleKind::BouncePad => {
            vel.y = -vel.y.abs() - effects.bounce_lift;
            vel.x *= effects.bounce_speedup;
            state.set_phase(TossPhase::Flying);
        }
        CollectibleKind::Rocket => {
            vel.x += effects.rocket_push;
            vel.y -= effects.rocket_lift;
        }
        CollectibleKind::Bomb => {
            vel.x += effects.bomb_push;
            vel.y = effects.bomb_vy;
            state.set_phase(TossPhase::Flying);
        }
        CollectibleKind::Barrier => {
            *vel = Vec2::ZERO;
            state.stop(StopReason::Blocked);
        }
        CollectibleKind::Star | CollectibleKind::Chips | CollectibleKind::Popcorn => {}
    }
}

/// Stream collectibles ahead and evict those far behind
fn extend_world(state: &mut TossState) {
    let x = state.projectile.pos.x;
    let spawn = &state.tuning.spawn;

    // A long step can jump several chunks at once
    while x > state.field.frontier() - spawn.refill_margin {
        let frontier = state.field.frontier();
        state.field.spawn_ahead(frontier + spawn.refill_chunk, &state.terrain);
        if state.field.frontier() <= frontier {
            break;
        }
    }

    if x > state.last_evict_x + spawn.evict_interval {
        state.field.evict_behind(x);
        state.last_evict_x = x;
    }
}
