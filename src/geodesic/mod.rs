//! Geodesic integration: sources, ray state, and the per-ray actor.
//!
//! A [`Geodesic`] owns the state of one ray plus fresh instances of every
//! configured diagnostic and terminator. One instance lives per worker
//! thread and is reset between pixels.

pub mod integrator;
pub mod termination;

pub use integrator::{Integrator, IntegratorKind};
pub use termination::{Term, Terminator, TerminatorSpec, TerminatorsSpec};

use log::warn;

use crate::diagnostics::{Diagnostic, DiagnosticsSpec};
use crate::metric::Metric;
use crate::tensor::{OneIndex, Point, ScreenIndex};

/// Optional right-hand side added to the geodesic equation. A closed set;
/// `None` leaves the equation unforced so the curve is a true geodesic.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    None,
}

impl Source {
    /// Source term S^a(x, u) added to the geodesic equation.
    pub fn source(&self, _pos: &Point, _vel: &OneIndex) -> OneIndex {
        match self {
            Source::None => OneIndex::zero(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Source::None => "No source".to_string(),
        }
    }
}

/// Snapshot of a ray's committed state, handed to terminators and
/// diagnostics on each step.
#[derive(Debug, Clone, Copy)]
pub struct RayState {
    pub pos: Point,
    pub vel: OneIndex,
    /// Affine parameter; starts at 0 and increases strictly monotonically.
    pub lambda: f64,
    pub termination: Term,
    pub screen_index: ScreenIndex,
}

impl RayState {
    fn initial(screen_index: ScreenIndex, pos: Point, vel: OneIndex) -> Self {
        Self {
            pos,
            vel,
            lambda: 0.0,
            termination: Term::Continue,
            screen_index,
        }
    }
}

/// The per-ray actor: advances its state one integration step at a time,
/// consults its terminators, and feeds its diagnostics.
pub struct Geodesic<'a> {
    metric: &'a Metric,
    source: &'a Source,
    integrator: Integrator,
    diagnostics_spec: &'a DiagnosticsSpec,
    terminators_spec: &'a TerminatorsSpec,

    state: RayState,
    diagnostics: Vec<Box<dyn Diagnostic>>,
    terminators: Vec<Terminator>,
}

impl<'a> Geodesic<'a> {
    /// Create an actor bound to the engine's shared pieces. The actor is
    /// unusable until [`reset`](Geodesic::reset) seeds it with a pixel.
    pub fn new(
        metric: &'a Metric,
        source: &'a Source,
        integrator: Integrator,
        diagnostics_spec: &'a DiagnosticsSpec,
        terminators_spec: &'a TerminatorsSpec,
    ) -> Self {
        Self {
            metric,
            source,
            integrator,
            diagnostics_spec,
            terminators_spec,
            state: RayState::initial(ScreenIndex::default(), OneIndex::zero(), OneIndex::zero()),
            diagnostics: Vec::new(),
            terminators: Vec::new(),
        }
    }

    /// Seed the actor with a new pixel: zero lambda, fresh diagnostics and
    /// terminators, and run every diagnostic's start-update path.
    pub fn reset(&mut self, screen_index: ScreenIndex, pos: Point, vel: OneIndex) {
        self.state = RayState::initial(screen_index, pos, vel);
        self.diagnostics = self.diagnostics_spec.instantiate();
        self.terminators = self.terminators_spec.instantiate();
        let state = self.state;
        for d in &mut self.diagnostics {
            d.update(&state);
        }
    }

    /// One integration step: commit the new state, consult terminators in
    /// registration order, then update diagnostics.
    pub fn advance(&mut self) {
        debug_assert_eq!(self.state.termination, Term::Continue);

        let (pos, vel, h) =
            self.integrator
                .step(self.metric, self.source, &self.state.pos, &self.state.vel);
        self.state.lambda += h;
        self.state.pos = pos;
        self.state.vel = vel;

        // The metric gets first say (it owns Term::Singularity), then the
        // configured terminators in order.
        self.state.termination = self.metric.internal_terminate(&self.state.pos);
        if self.state.termination == Term::Continue {
            let state = self.state;
            for t in &mut self.terminators {
                let cond = t.check(&state);
                if cond != Term::Continue {
                    self.state.termination = cond;
                    break;
                }
            }
        }

        let state = self.state;
        for d in &mut self.diagnostics {
            d.update(&state);
        }
    }

    /// Advance until a terminator fires; returns the cause.
    pub fn run_to_termination(&mut self) -> Term {
        while self.state.termination == Term::Continue {
            self.advance();
        }
        self.state.termination
    }

    pub fn termination(&self) -> Term {
        self.state.termination
    }

    pub fn state(&self) -> &RayState {
        &self.state
    }

    /// The full output record: the screen index first, then each
    /// diagnostic's final data string in registration order.
    pub fn final_record(&self) -> Vec<String> {
        if self.state.termination == Term::Continue {
            warn!("final_record() called on a geodesic that has not terminated");
        }
        let mut record = Vec::with_capacity(self.diagnostics.len() + 1);
        record.push(format!(
            "{} {}",
            self.state.screen_index.row, self.state.screen_index.col
        ));
        for d in &self.diagnostics {
            record.push(d.final_data_string());
        }
        record
    }

    /// The value the mesh uses for refinement distances: always the first
    /// (value) diagnostic's final data value.
    pub fn final_value(&self) -> Vec<f64> {
        if self.state.termination == Term::Continue {
            warn!("final_value() called on a geodesic that has not terminated");
        }
        self.diagnostics[0].final_data_value()
    }
}
