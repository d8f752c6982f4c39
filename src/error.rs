use thiserror::Error;

/// Errors raised while building an engine or feeding it mis-sized data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("mode count must be positive")]
    NoModes,
    #[error("mode count {0} is not a perfect square")]
    NonSquareModes(usize),
    #[error("velocity grid resolution must be at least 1, got {0}")]
    GridTooSmall(usize),
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("viscosity must be non-negative and finite, got {0}")]
    InvalidViscosity(f64),
    #[error("particle step multiplier must be finite, got {0}")]
    InvalidStepMultiplier(f64),
    #[error("dimension mismatch: expected length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
