//! Headless SENZ demo.
//!
//! Spawns a ring of wandering creatures around two watchers, runs the
//! scheduler for a few simulated seconds, retires one creature half-way
//! through, and prints the final perception report as JSON.
//!
//! ```text
//! senz-sim [config.toml] [frames]
//! ```

use std::process::ExitCode;

use senz_core::error::SenzError;
use senz_core::types::{Pose, Vec3};
use senz_sim::telemetry::{self, LogFormat};
use senz_sim::{SenseComponent, SenseScheduler, SimConfig, SimWorld};
use tracing::{error, info};

const DEFAULT_FRAMES: u64 = 300;
const CREATURES: u16 = 12;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::from_file(std::path::Path::new(&path)),
        None => Ok(SimConfig::default()),
    };
    let frames = args.next().and_then(|f| f.parse().ok()).unwrap_or(DEFAULT_FRAMES);

    match config.and_then(|config| run(&config, frames)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Simulation failed");
            eprintln!("senz-sim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &SimConfig, frames: u64) -> Result<String, SenzError> {
    telemetry::init_tracing(LogFormat::from_env_or(config.host.log_format));

    let world = SimWorld::new(config.host.cell_size);
    let creatures: Vec<_> = (0..CREATURES).map(|i| world.spawn(ring_position(i, 0.0))).collect();
    let mut agents = vec![
        SenseComponent::spawn(&world, &config.senz, Pose::new(Vec3::ZERO, Vec3::Z))?,
        SenseComponent::spawn(&world, &config.senz, Pose::new(Vec3::new(0.0, 0.0, 30.0), Vec3::new(0.0, 0.0, -1.0)))?,
    ];
    info!(creatures = creatures.len(), agents = agents.len(), frames, "Simulation starting");

    let mut scheduler = SenseScheduler::new(config.host.tick_secs);
    let retire_at = frames / 2;
    let mut frame = 0;
    scheduler.run(&world, &mut agents, frames, |now, world| {
        #[allow(clippy::cast_possible_truncation)]
        let t = now.secs() as f32;
        for (i, id) in (0..CREATURES).zip(&creatures) {
            world.move_to(*id, ring_position(i, t));
        }
        if frame == retire_at {
            world.retire(creatures[0]);
        }
        frame += 1;
    });

    let report = scheduler.report(&agents);
    scheduler.shutdown(&mut agents);
    report.to_json().map_err(|e| SenzError::Serialization(e.to_string()))
}

/// Creature `i` circling the origin; each walks its own ring at its own pace.
fn ring_position(i: u16, t: f32) -> Vec3 {
    let i = f32::from(i);
    let radius = 6.0 + i * 2.5;
    let angle = i * 0.7 + t * (0.2 + i * 0.03);
    Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
}
