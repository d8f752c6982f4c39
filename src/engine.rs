use std::time::Instant;

use log::{debug, info};

use crate::Real;
use crate::basis::{BasisFieldCache, BasisIndex};
use crate::density::{AdvectionScheme, DensityField};
use crate::error::EngineError;
use crate::force::{ForceSegment, Forcer};
use crate::integrator::{Integrator, StepStats};
use crate::modes::ModeState;
use crate::particles::{ParticleScheme, TracerParticles};
use crate::tensor::StructureTensor;
use crate::velocity::{Interpolation, VelocityField};

const PARTICLE_SEED: u32 = 12345;

/// Construction parameters for [`Engine`].
#[derive(Clone, Debug)]
pub struct EngineParams {
    /// Velocity grid cells per axis; the grid has `grid_res + 1` samples per axis.
    pub grid_res: usize,
    /// Number of basis modes, must be a perfect square.
    pub modes: usize,
    /// Density cells per axis. 0 runs without a density field.
    pub density_res: usize,
    pub viscosity: Real,
    pub dt: Real,
    /// Particle and density step is `dt * pdt_mult`.
    pub pdt_mult: Real,
    pub interpolation: Interpolation,
    pub advection: AdvectionScheme,
    /// Tracer particle count. 0 disables tracers.
    pub particles: usize,
    pub particle_scheme: ParticleScheme,
}

impl Default for EngineParams {
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
            particles: 0,
            particle_scheme: ParticleScheme::Rk4,
        }
    }
}

impl EngineParams {
    fn validate(&self) -> Result<(), EngineError> {
        if self.grid_res == 0 {
            return Err(EngineError::GridTooSmall(self.grid_res));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(EngineError::InvalidTimeStep(self.dt as f64));
        }
        if !(self.viscosity >= 0.0 && self.viscosity.is_finite()) {
            return Err(EngineError::InvalidViscosity(self.viscosity as f64));
        }
        if !self.pdt_mult.is_finite() {
            return Err(EngineError::InvalidStepMultiplier(self.pdt_mult as f64));
        }
        Ok(())
    }
}

/// Render-side copy of the engine state, reused across frames.
#[derive(Clone, Debug, Default)]
pub struct FrameSnapshot {
    pub grid_res: usize,
    pub density_res: usize,
    pub step: usize,
    pub u: Vec<Real>,
    pub v: Vec<Real>,
    /// Empty when the engine carries no density field.
    pub density: Vec<Real>,
    pub particles_x: Vec<Real>,
    pub particles_y: Vec<Real>,
}

impl FrameSnapshot {
    /// Pre-allocate a snapshot buffer matching the given engine dimensions.
    pub fn new_empty(grid_res: usize, density_res: usize, particle_count: usize) -> Self {
        let dim = grid_res + 1;
        FrameSnapshot {
            grid_res,
            density_res,
            step: 0,
            u: vec![0.0; dim * dim],
            v: vec![0.0; dim * dim],
            density: vec![0.0; density_res * density_res],
            particles_x: vec![0.0; particle_count],
            particles_y: vec![0.0; particle_count],
        }
    }
}

/// Owns the whole simulation: basis tables, coefficients, forcing and the
/// reconstructed fields.
pub struct Engine {
    index: BasisIndex,
    cache: BasisFieldCache,
    tensor: StructureTensor,
    modes: ModeState,
    forcer: Forcer,
    integrator: Integrator,
    velocity: VelocityField,
    density: Option<DensityField>,
    particles: Option<TracerParticles>,
    pdt_mult: Real,
    step: usize,
}

impl Engine {
    pub fn new(params: EngineParams) -> Result<Self, EngineError> {
        params.validate()?;
        let index = BasisIndex::new(params.modes)?;

        let start = Instant::now();
        let cache = BasisFieldCache::new(&index, params.grid_res);
        let tensor = StructureTensor::build(&index);
        let n = index.len();

        let modes = ModeState::new(&index, params.viscosity, params.dt);
        let mut velocity = VelocityField::new(params.grid_res, params.interpolation);
        velocity.expand(&modes.coef, &cache);

        let density = (params.density_res > 0).then(|| DensityField::new(params.density_res, params.advection));
        let particles = (params.particles > 0)
            .then(|| TracerParticles::random(params.particles, PARTICLE_SEED, params.particle_scheme));

        info!(
            "engine ready: {} modes (k ≤ {}), grid {}, density {}, tensor nnz {}, built in {:.1}ms",
            n,
            index.max_wavenumber(),
            params.grid_res,
            params.density_res,
            tensor.nnz(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            index,
            cache,
            tensor,
            modes,
            forcer: Forcer::new(n),
            integrator: Integrator::new(n),
            velocity,
            density,
            particles,
            pdt_mult: params.pdt_mult,
            step: 0,
        })
    }

    /// One full step: coefficients, velocity reconstruction, density and tracers.
    pub fn advance(&mut self) -> StepStats {
        let mut stats = self.integrator.advance(&mut self.modes, &self.tensor, &mut self.forcer);
        self.velocity.expand(&self.modes.coef, &self.cache);

        let dt = self.modes.dt;
        if let Some(density) = &mut self.density {
            density.advect(&self.velocity, dt, self.pdt_mult);
        }
        if let Some(particles) = &mut self.particles {
            particles.advect(&self.velocity, dt * self.pdt_mult);
        }

        self.step += 1;
        stats.step = self.step;
        debug!(
            "step {}: energy {:.6e} -> {:.6e} (renorm {}, forced {})",
            stats.step, stats.prev_energy, stats.energy, stats.renormalized, stats.forced
        );
        stats
    }

    /// Queue a force path; it takes effect on the next [`advance`](Self::advance).
    pub fn stir(&mut self, path: &[ForceSegment]) {
        self.forcer.stir(&self.index, path, self.modes.dt);
    }

    pub fn set_density_at(&mut self, x: Real, y: Real, value: Real) {
        if let Some(density) = &mut self.density {
            density.set_at(x, y, value);
        }
    }

    pub fn add_density_disc(&mut self, x: Real, y: Real, radius: Real, value: Real) {
        if let Some(density) = &mut self.density {
            density.fill_disc(x, y, radius, value);
        }
    }

    /// Restore the initial density disc.
    pub fn reset_density(&mut self) {
        if let Some(density) = &mut self.density {
            density.init();
        }
    }

    /// Bring the fluid to rest and drop any queued forces.
    pub fn reset(&mut self) {
        self.modes.clear();
        self.forcer = Forcer::new(self.index.len());
        self.velocity.expand(&self.modes.coef, &self.cache);
        self.reset_density();
    }

    pub fn velocity(&self) -> &VelocityField {
        &self.velocity
    }

    pub fn density(&self) -> Option<&DensityField> {
        self.density.as_ref()
    }

    pub fn particles(&self) -> Option<&TracerParticles> {
        self.particles.as_ref()
    }

    pub fn particles_mut(&mut self) -> Option<&mut TracerParticles> {
        self.particles.as_mut()
    }

    pub fn modes(&self) -> &ModeState {
        &self.modes
    }

    /// Direct coefficient access. Changes show up in the velocity field after
    /// the next step.
    pub fn modes_mut(&mut self) -> &mut ModeState {
        &mut self.modes
    }

    pub fn basis(&self) -> &BasisIndex {
        &self.index
    }

    pub fn tensor(&self) -> &StructureTensor {
        &self.tensor
    }

    pub fn energy(&self) -> Real {
        self.modes.energy()
    }

    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Snapshot buffer sized for this engine.
    pub fn new_snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::new_empty(
            self.velocity.grid_res(),
            self.density.as_ref().map_or(0, |d| d.res()),
            self.particles.as_ref().map_or(0, |p| p.len()),
        )
    }

    /// Copy current state into a pre-allocated snapshot, avoiding allocation.
    pub fn snapshot_into(&self, dst: &mut FrameSnapshot) {
        dst.step = self.step;
        dst.u.copy_from_slice(self.velocity.u());
        dst.v.copy_from_slice(self.velocity.v());
        if let Some(density) = &self.density {
            dst.density.copy_from_slice(density.values());
        }
        if let Some(particles) = &self.particles {
            dst.particles_x.copy_from_slice(&particles.xs);
            dst.particles_y.copy_from_slice(&particles.ys);
        }
    }
}
