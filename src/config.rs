use serde::Deserialize;

use crate::Real;
use crate::density::AdvectionScheme;
use crate::engine::EngineParams;
use crate::particles::ParticleScheme;
use crate::velocity::Interpolation;

const CONFIG_FILE: &str = "eigenfluid.yaml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub stimulus: StimulusConfig,
    pub run: RunConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid_res: usize,
    pub modes: usize,
    pub density_res: usize,
    pub viscosity: f64,
    pub dt: f64,
    pub pdt_mult: f64,
    pub interpolation: Interpolation,
    pub advection: AdvectionScheme,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StimulusConfig {
    /// Multiplier from pointer displacement to force.
    pub force_scale: f64,
    /// Density written at the stir point.
    pub source: f64,
    pub source_radius: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub steps: usize,
    pub log_interval: usize,
    pub particles: usize,
    pub particle_scheme: ParticleScheme,
    /// Radius of the scripted circular stir, in domain units.
    pub stir_radius: f64,
    /// Angular speed of the scripted stir, radians per step.
    pub stir_speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            stimulus: StimulusConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_res: 49,
            modes: 49,
            density_res: 49,
            viscosity: 0.005,
            dt: 0.1,
            pdt_mult: 1.0,
            interpolation: Interpolation::Bilinear,
            advection: AdvectionScheme::Euler,
        }
    }
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            force_scale: 100.0,
            source: 1.0,
            source_radius: 0.03,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 300,
            log_interval: 30,
            particles: 0,
            particle_scheme: ParticleScheme::Rk4,
            stir_radius: 0.25,
            stir_speed: 0.05,
        }
    }
}

impl Config {
    /// Engine construction parameters, including the run's tracer settings.
    pub fn to_params(&self) -> EngineParams {
        let e = &self.engine;
        EngineParams {
            grid_res: e.grid_res,
            modes: e.modes,
            density_res: e.density_res,
            viscosity: e.viscosity as Real,
            dt: e.dt as Real,
            pdt_mult: e.pdt_mult as Real,
            interpolation: e.interpolation,
            advection: e.advection,
            particles: self.run.particles,
            particle_scheme: self.run.particle_scheme,
        }
    }
}

/// Load `eigenfluid.yaml` from the working directory, falling back to defaults.
pub fn load() -> Config {
    load_from(std::path::Path::new(CONFIG_FILE))
}

pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("failed to parse {}: {e}; using defaults", path.display());
                Config::default()
            }
        },
        Err(e) => {
            log::warn!("failed to read {}: {e}; using defaults", path.display());
            Config::default()
        }
    }
}
