//! Numerical integration of the geodesic equation.
//!
//! A single fixed-order RK4 step with an adaptively chosen affine-parameter
//! step size. The step-size heuristic follows Noble et al. (2007) and
//! Dolence et al. (2009): harmonic combination of per-coordinate scales,
//! shrinking near the poles and wherever the velocity is large.

use std::f64::consts::PI;

use crate::constants::{DELTA_NODIV0, H_MIN};
use crate::geodesic::Source;
use crate::metric::Metric;
use crate::tensor::{OneIndex, Point};

/// The integration scheme in use. A closed set chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    /// Fixed-order Runge-Kutta 4 with adaptive step size.
    Rk4,
}

/// Integrator function plus its base step size epsilon.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    pub kind: IntegratorKind,
    pub base_step: f64,
}

impl Integrator {
    pub fn new(kind: IntegratorKind, base_step: f64) -> Self {
        Self { kind, base_step }
    }

    /// Advance `(pos, vel)` by one step. Returns the new position, new
    /// velocity, and the affine-parameter step actually taken.
    pub fn step(
        &self,
        metric: &Metric,
        source: &Source,
        pos: &Point,
        vel: &OneIndex,
    ) -> (Point, OneIndex, f64) {
        match self.kind {
            IntegratorKind::Rk4 => rk4_step(metric, source, pos, vel, self.base_step),
        }
    }

    pub fn description(&self) -> String {
        match self.kind {
            IntegratorKind::Rk4 => format!("Integrator: RK4 (base step size {})", self.base_step),
        }
    }
}

fn rk4_step(
    metric: &Metric,
    source: &Source,
    pos: &Point,
    vel: &OneIndex,
    epsilon: f64,
) -> (Point, OneIndex, f64) {
    // Per-coordinate affine-parameter scales; the theta scale collapses
    // toward the poles so the step refines there.
    let dlambda_r = epsilon / (vel[1].abs() + DELTA_NODIV0);
    let dlambda_theta = epsilon * pos[2].min(PI - pos[2]) / (vel[2].abs() + DELTA_NODIV0);
    let dlambda_phi = epsilon / (vel[3].abs() + DELTA_NODIV0);

    let h = 1.0 / (1.0 / dlambda_r.abs() + 1.0 / dlambda_theta.abs() + 1.0 / dlambda_phi.abs());
    // f64::max ignores NaN on the left, so a degenerate state still takes
    // the smallest allowed step and lambda keeps increasing.
    let h = h.max(H_MIN);

    // d/dlambda(u^a) = -Gamma^a_{bc} u^b u^c + S^a(x, u)
    let geo_rhs = |p: &Point, v: &OneIndex| -> OneIndex {
        let christoffel = metric.christoffel_udd(p);
        let mut rhs = source.source(p, v);
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    rhs[i] -= christoffel[i][j][k] * v[j] * v[k];
                }
            }
        }
        rhs
    };

    let k1 = geo_rhs(pos, vel);
    let l1 = *vel;

    let k2 = geo_rhs(&(*pos + 0.5 * h * l1), &(*vel + 0.5 * h * k1));
    let l2 = *vel + 0.5 * h * k1;

    let k3 = geo_rhs(&(*pos + 0.5 * h * l2), &(*vel + 0.5 * h * k2));
    let l3 = *vel + 0.5 * h * k2;

    let k4 = geo_rhs(&(*pos + h * l3), &(*vel + h * k3));
    let l4 = *vel + h * k3;

    let next_vel = *vel + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
    let next_pos = *pos + h / 6.0 * (l1 + 2.0 * l2 + 2.0 * l3 + l4);

    (next_pos, next_vel, h)
}
