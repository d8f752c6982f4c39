use serde::Deserialize;

use crate::Real;
use crate::velocity::VelocityField;

/// Back-trace integrator for semi-Lagrangian density advection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionScheme {
    /// `p - pdt·v(p)`
    #[default]
    Euler,
    /// Two-stage trace with the second sample taken ⅔ of the way back.
    Rk2,
}

/// Passive scalar on a `res × res` cell-centred grid (index `j * res + i`).
#[derive(Clone, Debug)]
pub struct DensityField {
    res: usize,
    values: Vec<Real>,
    pub scheme: AdvectionScheme,
}

impl DensityField {
    /// Field seeded with the initial disc (see [`init`](Self::init)).
    pub fn new(res: usize, scheme: AdvectionScheme) -> Self {
        let mut field = Self {
            res,
            values: vec![0.0; res * res],
            scheme,
        };
        field.init();
        field
    }

    pub fn res(&self) -> usize {
        self.res
    }

    pub fn values(&self) -> &[Real] {
        &self.values
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> Real {
        self.values[j * self.res + i]
    }

    /// Value 1 inside a disc of radius `res/4` around the grid centre, 0 elsewhere.
    pub fn init(&mut self) {
        let mid = (self.res / 2) as i64;
        let quarter = mid / 2;
        for j in 0..self.res {
            let dy = j as i64 - mid;
            for i in 0..self.res {
                let dx = i as i64 - mid;
                self.values[j * self.res + i] = if dx * dx + dy * dy < quarter * quarter { 1.0 } else { 0.0 };
            }
        }
    }

    /// Write `value` into the cell containing normalized `(x, y)`.
    /// Points outside the grid are ignored.
    pub fn set_at(&mut self, x: Real, y: Real, value: Real) {
        let gx = (x * self.res as Real).floor();
        let gy = (y * self.res as Real).floor();
        if !(gx.is_finite() && gy.is_finite()) || gx < 0.0 || gy < 0.0 {
            return;
        }
        let (i, j) = (gx as usize, gy as usize);
        if i < self.res && j < self.res {
            self.values[j * self.res + i] = value;
        }
    }

    /// Set every cell whose centre lies within `radius` of `(x, y)`.
    pub fn fill_disc(&mut self, x: Real, y: Real, radius: Real, value: Real) {
        let n = self.res as Real;
        let r2 = radius * radius;
        for j in 0..self.res {
            let cy = (j as Real + 0.5) / n - y;
            for i in 0..self.res {
                let cx = (i as Real + 0.5) / n - x;
                if cx * cx + cy * cy <= r2 {
                    self.values[j * self.res + i] = value;
                }
            }
        }
    }

    /// Bilinear reconstruction at normalized `(x, y)`, clamped to the grid.
    /// An empty grid samples as 0.
    pub fn sample_bilinear(&self, x: Real, y: Real) -> Real {
        if self.res == 0 {
            return 0.0;
        }
        let last = (self.res - 1) as Real;
        let xx = (x * self.res as Real - 0.5).clamp(0.0, last);
        let yy = (y * self.res as Real - 0.5).clamp(0.0, last);

        let x1 = xx as usize;
        let y1 = yy as usize;
        let x2 = (x1 + 1).min(self.res - 1);
        let y2 = (y1 + 1).min(self.res - 1);

        let d11 = self.at(x1, y1);
        let d21 = self.at(x2, y1);
        let d12 = self.at(x1, y2);
        let d22 = self.at(x2, y2);

        let dx = xx - x1 as Real;
        let dy = yy - y1 as Real;
        d11 + (d21 - d11) * dx + (d12 - d11) * dy + (d11 - d21 - d12 + d22) * dx * dy
    }

    /// Semi-Lagrangian step: every cell centre is traced back through
    /// `velocity` by `dt · pdt_mult` and resampled into a fresh buffer.
    pub fn advect(&mut self, velocity: &VelocityField, dt: Real, pdt_mult: Real) {
        let pdt = dt * pdt_mult;
        let n = self.res as Real;
        let mut next = vec![0.0; self.values.len()];

        for j in 0..self.res {
            for i in 0..self.res {
                let x = (i as Real + 0.5) / n;
                let y = (j as Real + 0.5) / n;
                let (sx, sy) = match self.scheme {
                    AdvectionScheme::Euler => {
                        let (vx, vy) = velocity.sample(x, y);
                        (x - pdt * vx, y - pdt * vy)
                    }
                    AdvectionScheme::Rk2 => {
                        let (v0x, v0y) = velocity.sample(x, y);
                        let back = 2.0 / 3.0 * pdt;
                        let (v1x, v1y) = velocity.sample(x - back * v0x, y - back * v0y);
                        (x - pdt * (v0x + 3.0 * v1x) / 4.0, y - pdt * (v0y + 3.0 * v1y) / 4.0)
                    }
                };
                next[j * self.res + i] = self.sample_bilinear(sx, sy);
            }
        }

        self.values = next;
    }

    /// Sum of all cell values.
    pub fn total(&self) -> Real {
        self.values.iter().sum()
    }
}
