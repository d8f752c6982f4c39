use std::path::PathBuf;
use std::time::Instant;

use log::{error, info};

use eigenfluid::config::{self, Config};
use eigenfluid::diagnostics::{
    compute_energy_spectrum, compute_kinetic_energy, compute_max_speed, compute_mean_density,
};
use eigenfluid::force::segment_path;
use eigenfluid::{Engine, Real};

fn parse_config_path() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| PathBuf::from(&w[1]))
}

/// Position of the scripted stirrer after `step` steps: a circle around the
/// domain centre.
fn stir_point(step: usize, radius: Real, speed: Real) -> (Real, Real) {
    let theta = step as Real * speed;
    (0.5 + radius * theta.cos(), 0.5 + radius * theta.sin())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match parse_config_path() {
        Some(path) => config::load_from(&path),
        None => config::load(),
    };

    let mut engine = match Engine::new(cfg.to_params()) {
        Ok(engine) => engine,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    run(&mut engine, &cfg);
}

fn run(engine: &mut Engine, cfg: &Config) {
    let stim = &cfg.stimulus;
    let run = &cfg.run;
    let (radius, speed) = (run.stir_radius as Real, run.stir_speed as Real);
    let log_interval = run.log_interval.max(1);

    let start = Instant::now();
    let mut prev = stir_point(0, radius, speed);
    for step in 1..=run.steps {
        let cur = stir_point(step, radius, speed);
        engine.stir(&segment_path(prev, cur, stim.force_scale as Real));
        engine.add_density_disc(cur.0, cur.1, stim.source_radius as Real, stim.source as Real);
        prev = cur;

        let stats = engine.advance();
        if step % log_interval == 0 || step == run.steps {
            let mean_density = engine.density().map_or(0.0, compute_mean_density);
            info!(
                "step {:>5}  energy {:.4e}  ke {:.4e}  max|v| {:.3}  density {:.4}",
                stats.step,
                stats.energy,
                compute_kinetic_energy(engine.velocity()),
                compute_max_speed(engine.velocity()),
                mean_density
            );
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let spectrum = compute_energy_spectrum(engine.basis(), engine.modes());
    let peak = spectrum
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (s, &e)| if e > best.1 { (s, e) } else { best });
    info!(
        "{} steps in {:.2}s ({:.1} steps/s), spectrum peak at shell {}",
        run.steps,
        elapsed,
        run.steps as f64 / elapsed.max(1e-9),
        peak.0
    );
}
