use crate::error::EngineError;
use crate::{PI, Real};

/// Bijection between linear mode indices and wavenumber pairs `(k1, k2)`.
///
/// Pairs are enumerated row-major over `1..=⌊√N⌋`, so index `i` maps to
/// `(i / √N + 1, i % √N + 1)`. The structure tensor relies on this order.
#[derive(Clone, Debug)]
pub struct BasisIndex {
    n_sqrt: i32,
    forward: Vec<(i32, i32)>,
    /// `(n_sqrt + 1)²` table indexed by `k1 * (n_sqrt + 1) + k2`.
    reverse: Vec<Option<usize>>,
}

impl BasisIndex {
    /// Build the lookup tables for `modes` basis functions.
    /// `modes` must be a positive perfect square.
    pub fn new(modes: usize) -> Result<Self, EngineError> {
        if modes == 0 {
            return Err(EngineError::NoModes);
        }
        let n_sqrt = (modes as f64).sqrt().floor() as usize;
        if n_sqrt * n_sqrt != modes {
            return Err(EngineError::NonSquareModes(modes));
        }

        let side = n_sqrt + 1;
        let mut forward = Vec::with_capacity(modes);
        let mut reverse = vec![None; side * side];
        for k1 in 1..=n_sqrt {
            for k2 in 1..=n_sqrt {
                reverse[k1 * side + k2] = Some(forward.len());
                forward.push((k1 as i32, k2 as i32));
            }
        }

        Ok(Self {
            n_sqrt: n_sqrt as i32,
            forward,
            reverse,
        })
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Largest wavenumber along either axis.
    pub fn max_wavenumber(&self) -> i32 {
        self.n_sqrt
    }

    /// Wavenumbers of mode `i`.
    #[inline]
    pub fn forward(&self, i: usize) -> (i32, i32) {
        self.forward[i]
    }

    /// Mode index for `(k1, k2)`, `None` outside `1..=⌊√N⌋`.
    #[inline]
    pub fn reverse(&self, k1: i32, k2: i32) -> Option<usize> {
        if k1 < 1 || k2 < 1 || k1 > self.n_sqrt || k2 > self.n_sqrt {
            return None;
        }
        let side = (self.n_sqrt + 1) as usize;
        self.reverse[k1 as usize * side + k2 as usize]
    }

    /// Laplacian eigenvalue magnitude `k1² + k2²` of mode `i`.
    pub fn eigenvalue(&self, i: usize) -> Real {
        let (k1, k2) = self.forward[i];
        (k1 * k1 + k2 * k2) as Real
    }
}

/// Velocity of eigenfunction `(a, b)` at `(x, y)` in `[0,π]²`.
///
/// `stagger` shifts the cosine arguments by `(½Δx, ½Δy)` to land on the
/// staggered grid; pass zeros for the analytic point value.
#[inline]
pub fn mode_velocity(a: i32, b: i32, x: Real, y: Real, stagger: (Real, Real)) -> (Real, Real) {
    let lambda = (a * a + b * b) as Real;
    let xfact = if a != 0 { -1.0 / lambda } else { 1.0 };
    let yfact = if b != 0 { -1.0 / lambda } else { 1.0 };
    let (a, b) = (a as Real, b as Real);
    let u = -b * xfact * (a * x).sin() * (b * (y + stagger.1)).cos();
    let v = a * yfact * (a * (x + stagger.0)).cos() * (b * y).sin();
    (u, v)
}

/// Sampled velocity of one eigenfunction on the `(res+1)²` grid.
#[derive(Clone, Debug)]
pub struct BasisField {
    pub u: Vec<Real>,
    pub v: Vec<Real>,
}

/// Every mode's basis field, computed once at construction.
#[derive(Clone, Debug)]
pub struct BasisFieldCache {
    grid_res: usize,
    fields: Vec<BasisField>,
}

impl BasisFieldCache {
    pub fn new(index: &BasisIndex, grid_res: usize) -> Self {
        let fields = (0..index.len())
            .map(|i| {
                let (a, b) = index.forward(i);
                basis_field(a, b, grid_res)
            })
            .collect();
        Self { grid_res, fields }
    }

    pub fn grid_res(&self) -> usize {
        self.grid_res
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, mode: usize) -> &BasisField {
        &self.fields[mode]
    }
}

/// Sample eigenfunction `(a, b)` at grid points `(iΔ, jΔ)`, `Δ = π/res`.
/// Storage is row-major in `j`: index `j * (res + 1) + i`.
fn basis_field(a: i32, b: i32, grid_res: usize) -> BasisField {
    let dim = grid_res + 1;
    let delta = PI / grid_res as Real;
    let stagger = (0.5 * delta, 0.5 * delta);
    let mut u = vec![0.0; dim * dim];
    let mut v = vec![0.0; dim * dim];
    for j in 0..dim {
        let y = j as Real * delta;
        for i in 0..dim {
            let x = i as Real * delta;
            let (fu, fv) = mode_velocity(a, b, x, y, stagger);
            u[j * dim + i] = fu;
            v[j * dim + i] = fv;
        }
    }
    BasisField { u, v }
}
