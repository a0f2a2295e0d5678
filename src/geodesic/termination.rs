//! Geodesic termination conditions.
//!
//! A [`Terminator`] is a predicate consulted after every integration step.
//! Each variant owns exactly one terminal [`Term`] value and may only return
//! that value or [`Term::Continue`]. Terminators are consulted in
//! registration order; the first non-`Continue` answer wins.

use std::fmt;

use super::RayState;

/// Why a geodesic stopped integrating. `Continue` means it has not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// Still integrating.
    Continue,
    /// Came too close to the event horizon.
    Horizon,
    /// Ran into a curvature singularity (owned by the metric provider hook;
    /// no shipped metric currently reports it).
    Singularity,
    /// Escaped through the boundary sphere.
    BoundarySphere,
    /// Exceeded the integration step budget.
    TimeOut,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Term::Continue => "Continue",
            Term::Horizon => "Horizon",
            Term::Singularity => "Singularity",
            Term::BoundarySphere => "BoundarySphere",
            Term::TimeOut => "TimeOut",
        };
        write!(f, "{name}")
    }
}

/// Per-terminator options, owned by the engine and instantiated per ray.
/// Order in the containing [`TerminatorsSpec`] is the registration order.
#[derive(Debug, Clone)]
pub enum TerminatorSpec {
    Horizon {
        /// Horizon radius of the metric in use.
        radius: f64,
        /// Whether the radial coordinate is u = ln r.
        log_radial: bool,
        /// Stop at radius * (1 + epsilon).
        epsilon: f64,
        update_every_n_steps: u64,
    },
    BoundarySphere {
        radius: f64,
        update_every_n_steps: u64,
    },
    TimeOut {
        max_steps: u64,
        update_every_n_steps: u64,
    },
}

impl TerminatorSpec {
    pub fn instantiate(&self) -> Terminator {
        match *self {
            TerminatorSpec::Horizon {
                radius,
                log_radial,
                epsilon,
                update_every_n_steps,
            } => Terminator::Horizon {
                radius,
                log_radial,
                epsilon,
                gate: UpdateGate::new(update_every_n_steps),
            },
            TerminatorSpec::BoundarySphere {
                radius,
                update_every_n_steps,
            } => Terminator::BoundarySphere {
                radius,
                gate: UpdateGate::new(update_every_n_steps),
            },
            TerminatorSpec::TimeOut {
                max_steps,
                update_every_n_steps,
            } => Terminator::TimeOut {
                max_steps,
                steps: 0,
                gate: UpdateGate::new(update_every_n_steps),
            },
        }
    }

    pub fn description(&self) -> String {
        match self {
            TerminatorSpec::Horizon { epsilon, .. } => {
                format!("Horizon (stop at {}x(horizon radius))", 1.0 + epsilon)
            }
            TerminatorSpec::BoundarySphere { radius, .. } => {
                format!("Boundary sphere (R = {radius})")
            }
            TerminatorSpec::TimeOut { max_steps, .. } => {
                format!("Time out (max integration steps: {max_steps})")
            }
        }
    }
}

/// The ordered set of terminators the engine hands to each ray.
#[derive(Debug, Clone)]
pub struct TerminatorsSpec(pub Vec<TerminatorSpec>);

impl TerminatorsSpec {
    pub fn instantiate(&self) -> Vec<Terminator> {
        self.0.iter().map(TerminatorSpec::instantiate).collect()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.0.iter().map(TerminatorSpec::description).collect()
    }
}

/// Gate that lets a check through only every `every` calls.
/// `every == 0` never fires.
#[derive(Debug, Clone, Copy)]
pub struct UpdateGate {
    every: u64,
    since: u64,
}

impl UpdateGate {
    pub(crate) fn new(every: u64) -> Self {
        Self { every, since: 0 }
    }

    pub(crate) fn ready(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.since += 1;
        if self.since >= self.every {
            self.since = 0;
            true
        } else {
            false
        }
    }
}

/// A live per-ray terminator instance.
#[derive(Debug, Clone)]
pub enum Terminator {
    Horizon {
        radius: f64,
        log_radial: bool,
        epsilon: f64,
        gate: UpdateGate,
    },
    BoundarySphere {
        radius: f64,
        gate: UpdateGate,
    },
    TimeOut {
        max_steps: u64,
        steps: u64,
        gate: UpdateGate,
    },
}

impl Terminator {
    /// Consult this terminator against the ray's committed state.
    /// On non-gate steps the state is not inspected at all.
    pub fn check(&mut self, ray: &RayState) -> Term {
        match self {
            Terminator::Horizon {
                radius,
                log_radial,
                epsilon,
                gate,
            } => {
                if !gate.ready() {
                    return Term::Continue;
                }
                let r = if *log_radial {
                    ray.pos[1].exp()
                } else {
                    ray.pos[1]
                };
                if r <= *radius * (1.0 + *epsilon) {
                    Term::Horizon
                } else {
                    Term::Continue
                }
            }
            Terminator::BoundarySphere { radius, gate } => {
                if !gate.ready() {
                    return Term::Continue;
                }
                if ray.pos[1] > *radius {
                    Term::BoundarySphere
                } else {
                    Term::Continue
                }
            }
            Terminator::TimeOut {
                max_steps,
                steps,
                gate,
            } => {
                // The step counter belongs to the terminator itself and
                // advances on every check, gated or not.
                *steps += 1;
                if gate.ready() && *steps >= *max_steps {
                    Term::TimeOut
                } else {
                    Term::Continue
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{OneIndex, ScreenIndex};

    fn state_at_r(r: f64) -> RayState {
        RayState {
            pos: OneIndex::new([0.0, r, std::f64::consts::FRAC_PI_2, 0.0]),
            vel: OneIndex::zero(),
            lambda: 1.0,
            termination: Term::Continue,
            screen_index: ScreenIndex::default(),
        }
    }

    #[test]
    fn horizon_triggers_within_epsilon() {
        let spec = TerminatorSpec::Horizon {
            radius: 2.0,
            log_radial: false,
            epsilon: 0.01,
            update_every_n_steps: 1,
        };
        let mut t = spec.instantiate();
        assert_eq!(t.check(&state_at_r(2.5)), Term::Continue);
        assert_eq!(t.check(&state_at_r(2.01)), Term::Horizon);
    }

    #[test]
    fn horizon_compares_exponentiated_radius_in_log_mode() {
        let spec = TerminatorSpec::Horizon {
            radius: 2.0,
            log_radial: true,
            epsilon: 0.0,
            update_every_n_steps: 1,
        };
        let mut t = spec.instantiate();
        // u = ln 3 => r = 3, outside the horizon
        assert_eq!(t.check(&state_at_r(3.0f64.ln())), Term::Continue);
        // u = ln 1.9 => r = 1.9, inside
        assert_eq!(t.check(&state_at_r(1.9f64.ln())), Term::Horizon);
    }

    #[test]
    fn boundary_sphere_is_strict_greater_than() {
        let spec = TerminatorSpec::BoundarySphere {
            radius: 1000.0,
            update_every_n_steps: 1,
        };
        let mut t = spec.instantiate();
        assert_eq!(t.check(&state_at_r(1000.0)), Term::Continue);
        assert_eq!(t.check(&state_at_r(1000.1)), Term::BoundarySphere);
    }

    #[test]
    fn timeout_counts_its_own_checks() {
        let spec = TerminatorSpec::TimeOut {
            max_steps: 3,
            update_every_n_steps: 1,
        };
        let mut t = spec.instantiate();
        let s = state_at_r(10.0);
        assert_eq!(t.check(&s), Term::Continue);
        assert_eq!(t.check(&s), Term::Continue);
        assert_eq!(t.check(&s), Term::TimeOut);
    }

    #[test]
    fn gated_terminator_skips_state_between_gates() {
        let spec = TerminatorSpec::BoundarySphere {
            radius: 5.0,
            update_every_n_steps: 3,
        };
        let mut t = spec.instantiate();
        let outside = state_at_r(50.0);
        assert_eq!(t.check(&outside), Term::Continue);
        assert_eq!(t.check(&outside), Term::Continue);
        assert_eq!(t.check(&outside), Term::BoundarySphere);
    }

    #[test]
    fn zero_gate_never_fires() {
        let spec = TerminatorSpec::TimeOut {
            max_steps: 1,
            update_every_n_steps: 0,
        };
        let mut t = spec.instantiate();
        let s = state_at_r(10.0);
        for _ in 0..10 {
            assert_eq!(t.check(&s), Term::Continue);
        }
    }
}
