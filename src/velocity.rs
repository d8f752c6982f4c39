use serde::Deserialize;

use crate::Real;
use crate::basis::BasisFieldCache;

/// Point-sampling strategy for the reconstructed velocity grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Bilinear,
    Bicubic,
}

/// Velocity sampled on the `(res+1)²` staggered grid.
///
/// Storage is row-major in `j` (index `j * dim + i`), matching the basis cache.
#[derive(Clone, Debug)]
pub struct VelocityField {
    grid_res: usize,
    dim: usize,
    u: Vec<Real>,
    v: Vec<Real>,
    pub interpolation: Interpolation,
}

impl VelocityField {
    pub fn new(grid_res: usize, interpolation: Interpolation) -> Self {
        let dim = grid_res + 1;
        Self {
            grid_res,
            dim,
            u: vec![0.0; dim * dim],
            v: vec![0.0; dim * dim],
            interpolation,
        }
    }

    pub fn grid_res(&self) -> usize {
        self.grid_res
    }

    /// Samples per axis (`grid_res + 1`).
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn u(&self) -> &[Real] {
        &self.u
    }

    pub fn v(&self) -> &[Real] {
        &self.v
    }

    /// Grid sample `(u, v)` at node `(i, j)`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> (Real, Real) {
        let k = j * self.dim + i;
        (self.u[k], self.v[k])
    }

    /// Rebuild the grid as `Σ q_k · basis_k`.
    pub fn expand(&mut self, coef: &[Real], cache: &BasisFieldCache) {
        assert_eq!(cache.grid_res(), self.grid_res, "basis cache resolution");
        self.u.fill(0.0);
        self.v.fill(0.0);
        for (k, &q) in coef.iter().enumerate() {
            if q == 0.0 {
                continue;
            }
            let basis = cache.field(k);
            for (dst, src) in self.u.iter_mut().zip(&basis.u) {
                *dst += q * src;
            }
            for (dst, src) in self.v.iter_mut().zip(&basis.v) {
                *dst += q * src;
            }
        }
    }

    /// Velocity at normalized `(x, y)` using the configured interpolation.
    pub fn sample(&self, x: Real, y: Real) -> (Real, Real) {
        match self.interpolation {
            Interpolation::Bilinear => self.sample_bilinear(x, y),
            Interpolation::Bicubic => self.sample_bicubic(x, y),
        }
    }

    /// Staggered bilinear lookup. `u` is read half a cell down, `v` half a
    /// cell left. Corners outside the grid are dropped and the weighted sum
    /// is divided by the number of corners used.
    pub fn sample_bilinear(&self, x: Real, y: Real) -> (Real, Real) {
        let gx = x * self.grid_res as Real;
        let gy = y * self.grid_res as Real;
        (
            self.interpolate_counted(&self.u, gx, gy - 0.5),
            self.interpolate_counted(&self.v, gx - 0.5, gy),
        )
    }

    /// Staggered Catmull-Rom lookup with clamped indices.
    pub fn sample_bicubic(&self, x: Real, y: Real) -> (Real, Real) {
        let gx = x * self.grid_res as Real;
        let gy = y * self.grid_res as Real;
        (
            self.interpolate_cubic(&self.u, gx, gy - 0.5),
            self.interpolate_cubic(&self.v, gx - 0.5, gy),
        )
    }

    fn interpolate_counted(&self, field: &[Real], x: Real, y: Real) -> Real {
        let i = x.floor() as i64;
        let j = y.floor() as i64;
        let max = self.grid_res as i64;
        let in_range = |c: i64| (0..=max).contains(&c);

        let corners = [
            (i, j, (i as Real + 1.0 - x) * (j as Real + 1.0 - y)),
            (i + 1, j, (x - i as Real) * (j as Real + 1.0 - y)),
            (i, j + 1, (i as Real + 1.0 - x) * (y - j as Real)),
            (i + 1, j + 1, (x - i as Real) * (y - j as Real)),
        ];

        let mut total = 0.0;
        let mut count = 0usize;
        for (ci, cj, w) in corners {
            if in_range(ci) && in_range(cj) {
                total += w * field[cj as usize * self.dim + ci as usize];
                count += 1;
            }
        }
        if count == 0 { 0.0 } else { total / count as Real }
    }

    fn interpolate_cubic(&self, field: &[Real], x: Real, y: Real) -> Real {
        let base_x = x.floor();
        let base_y = y.floor();
        let wx = catmull_rom_weights(x - base_x);
        let wy = catmull_rom_weights(y - base_y);
        let max = self.grid_res as i64;
        let clamp = |c: i64| c.clamp(0, max) as usize;

        let mut total = 0.0;
        for (dj, wj) in wy.iter().enumerate() {
            let row = clamp(base_y as i64 + dj as i64 - 1) * self.dim;
            let mut line = 0.0;
            for (di, wi) in wx.iter().enumerate() {
                line += wi * field[row + clamp(base_x as i64 + di as i64 - 1)];
            }
            total += wj * line;
        }
        total
    }
}

/// Catmull-Rom weights for samples at offsets `-1, 0, 1, 2` around `t ∈ [0,1)`.
#[inline]
fn catmull_rom_weights(t: Real) -> [Real; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        -0.5 * t + t2 - 0.5 * t3,
        1.0 - 2.5 * t2 + 1.5 * t3,
        0.5 * t + 2.0 * t2 - 1.5 * t3,
        -0.5 * t2 + 0.5 * t3,
    ]
}
