use crate::basis::{BasisIndex, mode_velocity};
use crate::{PI, Real};

/// Slack around `[0,1]` before a path entry counts as outside the domain.
const DOMAIN_MARGIN: Real = 1e-5;

/// One entry of a force path: position in `[0,1]²` and the force applied there.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceSegment {
    pub x: Real,
    pub y: Real,
    pub fx: Real,
    pub fy: Real,
}

impl ForceSegment {
    pub fn new(x: Real, y: Real, fx: Real, fy: Real) -> Self {
        Self { x, y, fx, fy }
    }

    fn in_domain(&self) -> bool {
        let inside = |c: Real| c > -DOMAIN_MARGIN && c < 1.0 + DOMAIN_MARGIN;
        inside(self.x) && inside(self.y)
    }
}

/// Force path for a drag through `points`: each entry pushes toward the next
/// point with `strength`, the final entry is the end point and carries no force.
pub fn drag_path(points: &[(Real, Real)], strength: Real) -> Vec<ForceSegment> {
    let mut path: Vec<ForceSegment> = points
        .windows(2)
        .map(|w| {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            ForceSegment::new(x0, y0, (x1 - x0) * strength, (y1 - y0) * strength)
        })
        .collect();
    if let Some(&(x, y)) = points.last() {
        path.push(ForceSegment::new(x, y, 0.0, 0.0));
    }
    path
}

/// Two-entry path for a single pointer move from `p1` to `p2`.
pub fn segment_path(p1: (Real, Real), p2: (Real, Real), strength: Real) -> Vec<ForceSegment> {
    drag_path(&[p1, p2], strength)
}

/// Projects force paths onto the mode basis and holds the result until the
/// next integration step drains it.
#[derive(Clone, Debug)]
pub struct Forcer {
    pending: Vec<Real>,
}

impl Forcer {
    pub fn new(modes: usize) -> Self {
        Self {
            pending: vec![0.0; modes],
        }
    }

    /// Coefficient increment `Δq` produced by `path` over one step `dt`.
    ///
    /// The last entry of `path` is its end point and contributes nothing.
    /// Entries outside the unit square are skipped.
    pub fn project(index: &BasisIndex, path: &[ForceSegment], dt: Real) -> Vec<Real> {
        let active: Vec<&ForceSegment> = path[..path.len().saturating_sub(1)]
            .iter()
            .filter(|s| s.in_domain())
            .collect();

        (0..index.len())
            .map(|i| {
                let (a, b) = index.forward(i);
                active
                    .iter()
                    .map(|s| {
                        let (vx, vy) = mode_velocity(a, b, s.x * PI, s.y * PI, (0.0, 0.0));
                        (vx * s.fx + vy * s.fy) * dt
                    })
                    .sum()
            })
            .collect()
    }

    /// Queue the projection of `path` for the next step.
    pub fn stir(&mut self, index: &BasisIndex, path: &[ForceSegment], dt: Real) {
        let dw = Self::project(index, path, dt);
        for (p, d) in self.pending.iter_mut().zip(dw) {
            *p += d;
        }
    }

    pub fn pending(&self) -> &[Real] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|&p| p != 0.0)
    }

    /// Add the queued increment into `coef` and reset the queue.
    pub fn drain_into(&mut self, coef: &mut [Real]) {
        for (q, p) in coef.iter_mut().zip(self.pending.iter_mut()) {
            *q += *p;
            *p = 0.0;
        }
    }
}
