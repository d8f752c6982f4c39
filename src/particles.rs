use serde::Deserialize;

use crate::Real;
use crate::velocity::VelocityField;

/// Keeps tracers strictly inside the unit square.
pub const PARTICLE_MARGIN: Real = 1e-7;

/// Forward integrator for tracer particles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleScheme {
    Euler,
    Rk2,
    #[default]
    Rk4,
}

/// Small xorshift generator for tracer seeding. A fixed seed gives the same
/// tracer layout on every run, so tests and recorded runs can rely on it.
pub struct Xor128 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

impl Xor128 {
    pub fn new(seed: u32) -> Self {
        Self {
            x: seed,
            y: seed.wrapping_mul(1812433253).wrapping_add(1),
            z: seed.wrapping_mul(1812433253).wrapping_mul(2).wrapping_add(2),
            w: seed.wrapping_mul(1812433253).wrapping_mul(3).wrapping_add(3),
        }
    }

    pub fn next(&mut self) -> u32 {
        let t = self.x ^ (self.x << 11);
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w = self.w ^ (self.w >> 19) ^ (t ^ (t >> 8));
        self.w
    }

    /// Returns a value in [0.0, 1.0]
    pub fn next_unit(&mut self) -> Real {
        (self.next() as f64 / u32::MAX as f64) as Real
    }
}

/// Massless markers carried along by the velocity field.
#[derive(Clone, Debug)]
pub struct TracerParticles {
    pub xs: Vec<Real>,
    pub ys: Vec<Real>,
    pub scheme: ParticleScheme,
}

impl TracerParticles {
    /// `count` particles on a regular lattice covering the unit square.
    pub fn lattice(count: usize, scheme: ParticleScheme) -> Self {
        let side = ((count as f64).sqrt().ceil() as usize).max(1);
        let step = 1.0 / side as Real;
        let (xs, ys) = (0..count)
            .map(|k| {
                let (i, j) = (k % side, k / side);
                ((i as Real + 0.5) * step, (j as Real + 0.5) * step)
            })
            .unzip();
        Self { xs, ys, scheme }
    }

    /// `count` particles at pseudo-random positions, reproducible for a given seed.
    pub fn random(count: usize, seed: u32, scheme: ParticleScheme) -> Self {
        let mut rng = Xor128::new(seed);
        let mut xs = Vec::with_capacity(count);
        let mut ys = Vec::with_capacity(count);
        for _ in 0..count {
            xs.push(rng.next_unit().clamp(PARTICLE_MARGIN, 1.0 - PARTICLE_MARGIN));
            ys.push(rng.next_unit().clamp(PARTICLE_MARGIN, 1.0 - PARTICLE_MARGIN));
        }
        Self { xs, ys, scheme }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Squeeze every particle into the square at `(x0, y0)` with side `extent`.
    pub fn gather(&mut self, x0: Real, y0: Real, extent: Real) {
        for (x, y) in self.xs.iter_mut().zip(self.ys.iter_mut()) {
            *x = *x * extent + x0;
            *y = *y * extent + y0;
        }
    }

    /// Move every particle forward through `velocity` by `pdt`.
    pub fn advect(&mut self, velocity: &VelocityField, pdt: Real) {
        let scheme = self.scheme;
        for (x, y) in self.xs.iter_mut().zip(self.ys.iter_mut()) {
            let (nx, ny) = step_particle(velocity, *x, *y, pdt, scheme);
            *x = nx.clamp(PARTICLE_MARGIN, 1.0 - PARTICLE_MARGIN);
            *y = ny.clamp(PARTICLE_MARGIN, 1.0 - PARTICLE_MARGIN);
        }
    }
}

fn step_particle(velocity: &VelocityField, x: Real, y: Real, pdt: Real, scheme: ParticleScheme) -> (Real, Real) {
    let v0 = velocity.sample(x, y);
    match scheme {
        ParticleScheme::Euler => (x + pdt * v0.0, y + pdt * v0.1),
        ParticleScheme::Rk2 => {
            let back = 2.0 / 3.0 * pdt;
            let v1 = velocity.sample(x - back * v0.0, y - back * v0.1);
            (x + pdt * (v0.0 + 3.0 * v1.0) / 4.0, y + pdt * (v0.1 + 3.0 * v1.1) / 4.0)
        }
        ParticleScheme::Rk4 => {
            let v1 = velocity.sample(x + 0.5 * pdt * v0.0, y + 0.5 * pdt * v0.1);
            let v2 = velocity.sample(x + 0.5 * pdt * v1.0, y + 0.5 * pdt * v1.1);
            let v3 = velocity.sample(x + pdt * v2.0, y + pdt * v2.1);
            (
                x + pdt * (v0.0 + 2.0 * v1.0 + 2.0 * v2.0 + v3.0) / 6.0,
                y + pdt * (v0.1 + 2.0 * v1.1 + 2.0 * v2.1 + v3.1) / 6.0,
            )
        }
    }
}
