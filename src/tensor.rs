//! Quadratic mode-interaction tensor.
//!
//! For the Laplacian eigenfunctions on `[0,π]²` the advection term
//! projected back onto the basis is `dq_k/dt = qᵀ C_k q`. Products of sines
//! and cosines only excite the sum and difference wavenumbers, so each pair
//! of modes touches at most four `C_k` and every coefficient is closed form.

use crate::Real;
use crate::basis::BasisIndex;
use crate::sparse::SparseRowMatrix;

/// Sign combinations `(s1, s2)` forming the antipair `(a1 + s1·b1, a2 + s2·b2)`.
const ANTIPAIR_SIGNS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Interaction density of `(a1,a2)` with `(b1,b2)` for antipair combination `c`.
fn coef_density(a1: i32, a2: i32, b1: i32, b2: i32, c: usize) -> Real {
    let cross = (a1 * b2 - a2 * b1) as Real;
    let mixed = (a1 * b2 + a2 * b1) as Real;
    match c {
        0 => -0.25 * cross,
        1 => 0.25 * mixed,
        2 => -0.25 * mixed,
        _ => 0.25 * cross,
    }
}

#[derive(Clone, Debug)]
pub struct StructureTensor {
    matrices: Vec<SparseRowMatrix>,
}

impl StructureTensor {
    /// Build every `C_k`. O(N²) with constant work per mode pair.
    pub fn build(index: &BasisIndex) -> Self {
        let n = index.len();
        let mut matrices = vec![SparseRowMatrix::new(n, n); n];

        for d1 in 0..n {
            let (a1, a2) = index.forward(d1);
            let lambda_a = -((a1 * a1 + a2 * a2) as Real);
            for d2 in 0..n {
                let (b1, b2) = index.forward(d2);
                let lambda_b = -((b1 * b1 + b2 * b2) as Real);

                for (c, &(s1, s2)) in ANTIPAIR_SIGNS.iter().enumerate() {
                    let Some(k) = index.reverse(a1 + s1 * b1, a2 + s2 * b2) else {
                        continue;
                    };
                    let coeff = -coef_density(a1, a2, b1, b2, c) / lambda_b;
                    matrices[k].set(d1, d2, coeff);
                    matrices[k].set(d2, d1, coeff * (-lambda_b / lambda_a));
                }
            }
        }

        Self { matrices }
    }

    /// Number of modes.
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn matrix(&self, k: usize) -> &SparseRowMatrix {
        &self.matrices[k]
    }

    /// Total stored coefficients across all `C_k`.
    pub fn nnz(&self) -> usize {
        self.matrices.iter().map(SparseRowMatrix::nnz).sum()
    }

    /// Evaluate `out[k] = qᵀ C_k q` for every mode.
    ///
    /// Panics if `q` or `out` does not have one entry per mode.
    pub fn derivative(&self, q: &[Real], out: &mut [Real]) {
        assert_eq!(q.len(), self.matrices.len(), "coefficient vector length");
        assert_eq!(out.len(), self.matrices.len(), "derivative buffer length");
        for (o, ck) in out.iter_mut().zip(&self.matrices) {
            *o = ck.quadratic_form_unchecked(q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_mode_has_no_interaction() {
        let index = BasisIndex::new(1).unwrap();
        let tensor = StructureTensor::build(&index);
        assert_eq!(tensor.len(), 1);
        assert_eq!(tensor.nnz(), 0);
        let mut out = [1.0];
        tensor.derivative(&[3.0], &mut out);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_known_coefficient() {
        // N = 4: modes (1,1)=0 (1,2)=1 (2,1)=2 (2,2)=3.
        // a = (1,2), b = (1,1) under "+-" reaches (2,1):
        //   density = -¼(1·1 + 2·1) = -¾, λb = -2, coeff = -(-¾)/(-2) = -0.375.
        let index = BasisIndex::new(4).unwrap();
        let tensor = StructureTensor::build(&index);
        let k = index.reverse(2, 1).unwrap();
        let c = tensor.matrix(k).get(1, 0);
        assert!((c - (-0.375)).abs() < 1e-12, "C[(2,1)][1,0] = {}", c);
        // Matched entry scaled by -λb/λa = -(-2)/(-5) = -0.4
        let c_t = tensor.matrix(k).get(0, 1);
        assert!((c_t - 0.15).abs() < 1e-12, "C[(2,1)][0,1] = {}", c_t);
    }

    #[test]
    fn test_entries_only_for_valid_antipairs() {
        let index = BasisIndex::new(9).unwrap();
        let tensor = StructureTensor::build(&index);
        for k in 0..tensor.len() {
            let (k1, k2) = index.forward(k);
            for a in 0..index.len() {
                for b in 0..index.len() {
                    if tensor.matrix(k).get(a, b) == 0.0 {
                        continue;
                    }
                    let (a1, a2) = index.forward(a);
                    let (b1, b2) = index.forward(b);
                    let reachable = ANTIPAIR_SIGNS.iter().any(|&(s1, s2)| {
                        (a1 + s1 * b1, a2 + s2 * b2) == (k1, k2)
                            || (b1 + s1 * a1, b2 + s2 * a2) == (k1, k2)
                    });
                    assert!(reachable, "C_{} has stray entry at ({}, {})", k, a, b);
                }
            }
        }
    }

    #[test]
    fn test_derivative_matches_checked_quadratic_form() {
        let index = BasisIndex::new(16).unwrap();
        let tensor = StructureTensor::build(&index);
        assert!(tensor.nnz() > 0);
        let q: Vec<Real> = (0..16).map(|i| ((i * 7 % 5) as Real - 2.0) * 0.3 + 0.1).collect();
        let mut dq = vec![0.0; 16];
        tensor.derivative(&q, &mut dq);
        for k in 0..16 {
            let expected = tensor.matrix(k).quadratic_form(&q).unwrap();
            assert!((dq[k] - expected).abs() < 1e-12, "mode {}: {} vs {}", k, dq[k], expected);
        }
    }

    #[test]
    #[should_panic]
    fn test_derivative_wrong_length_panics() {
        let index = BasisIndex::new(4).unwrap();
        let tensor = StructureTensor::build(&index);
        let mut out = [0.0; 4];
        tensor.derivative(&[1.0, 2.0], &mut out);
    }
}
