//! Spectral 2D fluid engine built on Laplacian eigenfunctions.
//!
//! Velocity lives in a truncated basis of `N` modes on `[0,π]²`. Each step
//! integrates the mode coefficients with RK4 against a precomputed
//! structure tensor, reconstructs a sampled velocity grid and advects a
//! passive density field through it.

pub mod basis;
pub mod config;
pub mod density;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod force;
pub mod integrator;
pub mod modes;
pub mod particles;
pub mod sparse;
pub mod tensor;
pub mod velocity;

pub use density::{AdvectionScheme, DensityField};
pub use engine::{Engine, EngineParams, FrameSnapshot};
pub use error::EngineError;
pub use force::ForceSegment;
pub use integrator::StepStats;
pub use particles::ParticleScheme;
pub use velocity::{Interpolation, VelocityField};

#[cfg(not(feature = "single-precision"))]
mod precision {
    /// Scalar type used throughout the engine.
    pub type Real = f64;
    pub const PI: Real = std::f64::consts::PI;
    #[cfg(test)]
    pub const TOLERANCE: Real = 1e-12;
}

#[cfg(feature = "single-precision")]
mod precision {
    /// Scalar type used throughout the engine.
    pub type Real = f32;
    pub const PI: Real = std::f32::consts::PI;
    #[cfg(test)]
    pub const TOLERANCE: Real = 1e-4;
}

pub use precision::{PI, Real};

/// Float comparison slack for tests, sized to the build's precision.
#[cfg(test)]
pub(crate) use precision::TOLERANCE;
