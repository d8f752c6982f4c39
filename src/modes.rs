use crate::Real;
use crate::basis::BasisIndex;

/// Mode coefficients plus the per-mode eigenvalue tables.
#[derive(Clone, Debug)]
pub struct ModeState {
    /// Coefficient vector `q`.
    pub coef: Vec<Real>,
    /// `λ_i = k1² + k2²`.
    eigs: Vec<Real>,
    eigs_inv: Vec<Real>,
    eigs_inv_root: Vec<Real>,
    pub viscosity: Real,
    pub dt: Real,
}

impl ModeState {
    pub fn new(index: &BasisIndex, viscosity: Real, dt: Real) -> Self {
        let eigs: Vec<Real> = (0..index.len()).map(|i| index.eigenvalue(i)).collect();
        let eigs_inv = eigs.iter().map(|&e| 1.0 / e).collect();
        let eigs_inv_root = eigs.iter().map(|&e| 1.0 / e.sqrt()).collect();
        Self {
            coef: vec![0.0; index.len()],
            eigs,
            eigs_inv,
            eigs_inv_root,
            viscosity,
            dt,
        }
    }

    pub fn len(&self) -> usize {
        self.coef.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coef.is_empty()
    }

    pub fn eigenvalues(&self) -> &[Real] {
        &self.eigs
    }

    pub fn inverse_eigenvalues(&self) -> &[Real] {
        &self.eigs_inv
    }

    pub fn inverse_eigenvalue_roots(&self) -> &[Real] {
        &self.eigs_inv_root
    }

    /// Energy measure `Σ λ_i⁻¹ q_i²`.
    pub fn energy(&self) -> Real {
        self.eigs_inv
            .iter()
            .zip(&self.coef)
            .map(|(inv, q)| inv * q * q)
            .sum()
    }

    /// Rescale `q` so that [`energy`](Self::energy) equals `desired`.
    /// Leaves `q` alone when the current energy is not positive.
    pub fn set_energy(&mut self, desired: Real) {
        let current = self.energy();
        if current <= 0.0 {
            return;
        }
        let fact = (desired / current).sqrt();
        for q in &mut self.coef {
            *q *= fact;
        }
    }

    /// Apply `q_i *= exp(-λ_i·dt·ν)`.
    pub fn apply_viscous_decay(&mut self) {
        let rate = self.dt * self.viscosity;
        for (q, &e) in self.coef.iter_mut().zip(&self.eigs) {
            *q *= (-e * rate).exp();
        }
    }

    /// Zero every coefficient.
    pub fn clear(&mut self) {
        self.coef.fill(0.0);
    }
}
