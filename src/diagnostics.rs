use crate::Real;
use crate::basis::BasisIndex;
use crate::density::DensityField;
use crate::modes::ModeState;
use crate::velocity::VelocityField;

/// Grid-averaged kinetic energy: KE = 0.5 * <u² + v²>.
pub fn compute_kinetic_energy(velocity: &VelocityField) -> Real {
    let n = velocity.u().len();
    if n == 0 {
        return 0.0;
    }
    let sum: Real = velocity
        .u()
        .iter()
        .zip(velocity.v())
        .map(|(u, v)| u * u + v * v)
        .sum();
    0.5 * sum / n as Real
}

/// Largest grid-sample speed.
pub fn compute_max_speed(velocity: &VelocityField) -> Real {
    velocity
        .u()
        .iter()
        .zip(velocity.v())
        .map(|(u, v)| (u * u + v * v).sqrt())
        .fold(0.0, Real::max)
}

/// Mean density over the grid.
pub fn compute_mean_density(density: &DensityField) -> Real {
    let n = density.values().len();
    if n == 0 { 0.0 } else { density.total() / n as Real }
}

/// Modal energy grouped by integer shell `⌊√λ⌋`.
/// Entry `s` holds `Σ λ⁻¹ q²` over modes with `s ≤ √λ < s + 1`.
pub fn compute_energy_spectrum(index: &BasisIndex, modes: &ModeState) -> Vec<Real> {
    let max_shell = ((2 * index.max_wavenumber() * index.max_wavenumber()) as f64).sqrt() as usize;
    let mut shells = vec![0.0; max_shell + 1];
    for (i, &q) in modes.coef.iter().enumerate() {
        let lambda = index.eigenvalue(i);
        let shell = (lambda as f64).sqrt().floor() as usize;
        shells[shell] += q * q / lambda;
    }
    shells
}
