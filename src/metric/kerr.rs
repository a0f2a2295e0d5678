//! Kerr spacetime metric for a rotating black hole.
//!
//! Boyer-Lindquist coordinates with the closed-form covariant and
//! contravariant components, parameterized by the spin a (mass fixed to 1 in
//! geometric units). Supports a logarithmic radial coordinate u = ln r,
//! which absorbs the dr = r du Jacobian into the rr component.
//!
//! # References
//!
//! - Kerr, R. P. (1963). "Gravitational field of a spinning mass"
//! - Visser, M. (2007). "The Kerr spacetime: A Brief Introduction"

use crate::tensor::{Point, TwoIndex};

/// A Kerr (rotating) black hole spacetime with M = 1.
///
/// # Example
///
/// ```
/// use nullray::metric::Kerr;
///
/// let bh = Kerr::new(0.5, false);
/// assert!((bh.horizon_radius() - (1.0 + 0.75f64.sqrt())).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Kerr {
    a: f64,
    log_radial: bool,
    horizon_radius: f64,
}

impl Kerr {
    /// Create a Kerr metric with spin `a`, clamped to [-1, 1].
    pub fn new(a: f64, log_radial: bool) -> Self {
        let a = a.clamp(-1.0, 1.0);
        Self {
            a,
            log_radial,
            horizon_radius: 1.0 + (1.0 - a * a).sqrt(),
        }
    }

    /// Spin parameter a.
    #[inline]
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Outer horizon radius r_+ = 1 + sqrt(1 - a^2).
    #[inline]
    pub fn horizon_radius(&self) -> f64 {
        self.horizon_radius
    }

    /// Whether the radial coordinate is u = ln r.
    #[inline]
    pub fn log_radial(&self) -> bool {
        self.log_radial
    }

    pub fn metric_dd(&self, p: &Point) -> TwoIndex {
        // In log-radial mode the stored coordinate is u = ln r.
        let r = if self.log_radial { p[1].exp() } else { p[1] };
        let a = self.a;

        let theta = p[2];
        let sint = theta.sin();
        let cost = theta.cos();
        let sigma = r * r + a * a * cost * cost;
        let delta = r * r + a * a - 2.0 * r;
        let big_a = (r * r + a * a) * (r * r + a * a) - delta * a * a * sint * sint;

        let g_tt = -(1.0 - 2.0 * r / sigma);
        let mut g_rr = sigma / delta;
        let g_thth = sigma;
        let g_phph = big_a / sigma * sint * sint;
        let g_tph = -2.0 * a * r * sint * sint / sigma;

        // dr = r du, so the rr component picks up a factor r^2.
        if self.log_radial {
            g_rr *= r * r;
        }

        TwoIndex::new([
            [g_tt, 0.0, 0.0, g_tph],
            [0.0, g_rr, 0.0, 0.0],
            [0.0, 0.0, g_thth, 0.0],
            [g_tph, 0.0, 0.0, g_phph],
        ])
    }

    pub fn metric_uu(&self, p: &Point) -> TwoIndex {
        let r = if self.log_radial { p[1].exp() } else { p[1] };
        let a = self.a;

        let theta = p[2];
        let sint = theta.sin();
        let cost = theta.cos();
        let sigma = r * r + a * a * cost * cost;
        let delta = r * r + a * a - 2.0 * r;
        let big_a = (r * r + a * a) * (r * r + a * a) - delta * a * a * sint * sint;

        let g_tt = -big_a / (sigma * delta);
        let mut g_rr = delta / sigma;
        let g_thth = 1.0 / sigma;
        let g_phph = (delta - a * a * sint * sint) / (sigma * delta * sint * sint);
        let g_tph = -2.0 * a * r / (sigma * delta);

        if self.log_radial {
            g_rr /= r * r;
        }

        TwoIndex::new([
            [g_tt, 0.0, 0.0, g_tph],
            [0.0, g_rr, 0.0, 0.0],
            [0.0, 0.0, g_thth, 0.0],
            [g_tph, 0.0, 0.0, g_phph],
        ])
    }

    pub fn description(&self) -> String {
        format!(
            "Kerr (a = {}, {})",
            self.a,
            if self.log_radial {
                "using logarithmic r coord"
            } else {
                "using normal r coord"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::OneIndex;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn horizon_radius_limits() {
        assert_relative_eq!(Kerr::new(0.0, false).horizon_radius(), 2.0);
        assert_relative_eq!(Kerr::new(1.0, false).horizon_radius(), 1.0);
    }

    #[test]
    fn schwarzschild_limit_on_the_equator() {
        let bh = Kerr::new(0.0, false);
        let r = 10.0;
        let p = OneIndex::new([0.0, r, FRAC_PI_2, 0.0]);
        let g = bh.metric_dd(&p);
        assert_relative_eq!(g[0][0], -(1.0 - 2.0 / r), max_relative = 1e-12);
        assert_relative_eq!(g[1][1], 1.0 / (1.0 - 2.0 / r), max_relative = 1e-12);
        assert_relative_eq!(g[2][2], r * r, max_relative = 1e-12);
        assert_relative_eq!(g[3][3], r * r, max_relative = 1e-12);
        assert_eq!(g[0][3], 0.0);
    }

    #[test]
    fn contravariant_inverts_covariant() {
        let bh = Kerr::new(0.7, false);
        let p = OneIndex::new([0.0, 5.0, 1.1, 0.4]);
        let g = bh.metric_dd(&p);
        let g_inv = bh.metric_uu(&p);
        for mu in 0..4 {
            for nu in 0..4 {
                let mut prod = 0.0;
                for sigma in 0..4 {
                    prod += g_inv[mu][sigma] * g[sigma][nu];
                }
                let expected = if mu == nu { 1.0 } else { 0.0 };
                assert_relative_eq!(prod, expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn metric_signature_outside_horizon() {
        let bh = Kerr::new(0.5, false);
        let g = bh.metric_dd(&OneIndex::new([0.0, 10.0, FRAC_PI_2, 0.0]));
        assert!(g[0][0] < 0.0, "g_tt should be timelike at r=10");
        assert!(g[1][1] > 0.0);
        assert!(g[2][2] > 0.0);
        assert!(g[3][3] > 0.0);
    }

    #[test]
    fn log_radial_rescales_rr_only() {
        let bh = Kerr::new(0.5, false);
        let bh_log = Kerr::new(0.5, true);
        let r = 7.0;
        let p = OneIndex::new([0.0, r, 1.0, 0.0]);
        let p_log = OneIndex::new([0.0, r.ln(), 1.0, 0.0]);
        let g = bh.metric_dd(&p);
        let g_log = bh_log.metric_dd(&p_log);
        assert_relative_eq!(g_log[1][1], g[1][1] * r * r, max_relative = 1e-12);
        assert_relative_eq!(g_log[0][0], g[0][0], max_relative = 1e-12);
        assert_relative_eq!(g_log[3][3], g[3][3], max_relative = 1e-12);

        let gi = bh.metric_uu(&p);
        let gi_log = bh_log.metric_uu(&p_log);
        assert_relative_eq!(gi_log[1][1], gi[1][1] / (r * r), max_relative = 1e-12);
    }
}
