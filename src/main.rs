//! Slingshot Toss headless runner
//!
//! Plays one seeded toss with a scripted full-power drag, logs every pulse
//! the simulation emits and prints the final result as JSON.
//!
//! Usage: `slingshot-toss [seed] [tuning.json]` (log level via `RUST_LOG`)

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use glam::Vec2;
    use slingshot_toss::TossTuning;
    use slingshot_toss::consts::{MAX_RUN_FRAMES, SIM_DT};
    use slingshot_toss::sim::{Drag, TickInput, TossEventKind, TossPhase, TossState};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = match args.next() {
        Some(arg) => arg.parse()?,
        None => 12345,
    };
    let tuning = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            TossTuning::from_json(&json)
                .inspect_err(|e| log::warn!("Rejected tuning from {}: {}", path, e))?
        }
        None => TossTuning::default(),
    };

    let mut state = TossState::new(tuning, seed);

    // Pull straight back and a little down: a full-power launch slightly upward
    let anchor = Vec2::new(360.0, 380.0);
    let drag = Drag::new(anchor, anchor + Vec2::new(-140.0, 50.0));
    state.update(&TickInput::begin(), SIM_DT);
    state.update(
        &TickInput {
            aim: Some(drag),
            ..Default::default()
        },
        SIM_DT,
    );
    log::info!("Aim preview has {} points", state.aim_preview().len());
    state.update(&TickInput::release(drag), SIM_DT);

    for _ in 0..MAX_RUN_FRAMES {
        // Dive when dropping toward the ground or riding a downhill
        let p = state.projectile();
        let dive = match state.phase() {
            TossPhase::Flying => p.vel.y > 0.0 && state.height_above_ground() < 400.0,
            TossPhase::Surfing { .. } => state.terrain().slope(p.pos.x) > 0.1,
            _ => false,
        };
        state.update(&TickInput::dive(dive), SIM_DT);

        for event in state.drain_events() {
            match event.kind {
                TossEventKind::Collected(kind) => log::info!(
                    "[{:>7.0} ms] {:?} at x={:.0}",
                    event.time_ms,
                    kind,
                    event.pos.x
                ),
                other => log::debug!("[{:>7.0} ms] {:?}", event.time_ms, other),
            }
        }

        if let Some(result) = state.take_result() {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
    }

    log::warn!(
        "Toss still {} after {} frames, giving up",
        state.phase().name(),
        MAX_RUN_FRAMES
    );
    println!("{}", serde_json::to_string_pretty(state.stats())?);
    Ok(())
}
