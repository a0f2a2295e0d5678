//! Per-ray observers.
//!
//! A [`Diagnostic`] samples the state of its owning ray on a schedule and
//! produces, once the ray terminates, an output string for the files, a
//! scalar-vector "value", and a distance function over such values. The
//! first diagnostic in an engine's [`DiagnosticsSpec`] is the *value
//! diagnostic*: its distance drives mesh refinement.
//!
//! Unlike metrics and terminators, diagnostics are an open extension point:
//! new observers implement the trait without touching the engine.

use log::warn;

use crate::geodesic::{RayState, Term};
use crate::tensor::Point;

/// When a diagnostic samples its ray.
///
/// With `n_steps == 0` the diagnostic is event-driven only: it updates at
/// the start and/or the finish according to the flags. With `n_steps > 0`
/// it additionally updates every `n_steps` integration steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateFrequency {
    pub n_steps: u64,
    pub on_start: bool,
    pub on_finish: bool,
}

/// Shared gating logic. The step counter belongs to the diagnostic and is
/// only consulted on plain (non-start, non-finish) steps.
fn decide_update(frequency: &UpdateFrequency, steps_since: &mut u64, ray: &RayState) -> bool {
    if frequency.n_steps == 0 {
        return (frequency.on_start && ray.lambda == 0.0)
            || (frequency.on_finish && ray.termination != Term::Continue);
    }
    if frequency.on_start && ray.lambda == 0.0 {
        return true;
    }
    if frequency.on_finish && ray.termination != Term::Continue {
        return true;
    }
    *steps_since += 1;
    if *steps_since >= frequency.n_steps {
        *steps_since = 0;
        true
    } else {
        false
    }
}

/// A per-ray observer. Implementations are created fresh for every ray.
pub trait Diagnostic: Send + Sync {
    /// Sample the ray's committed state (subject to the update schedule).
    fn update(&mut self, ray: &RayState);

    /// Full output string for the ray, written to this diagnostic's files.
    fn final_data_string(&self) -> String;

    /// The scalar-vector value associated with the finished ray.
    fn final_data_value(&self) -> Vec<f64>;

    /// Distance (>= 0) between two values from [`final_data_value`].
    ///
    /// [`final_data_value`]: Diagnostic::final_data_value
    fn distance(&self, val1: &[f64], val2: &[f64]) -> f64;

    /// Short name without spaces, used in output file names.
    fn name(&self) -> &'static str;

    /// Full description (spaces allowed) for logs and file headers.
    fn description(&self) -> String;
}

/// Options for one diagnostic kind. The engine owns one spec per enabled
/// diagnostic; rays instantiate fresh observers from it on every reset.
#[derive(Debug, Clone)]
pub enum DiagnosticSpec {
    FourColorScreen {
        frequency: UpdateFrequency,
    },
    GeodesicPosition {
        frequency: UpdateFrequency,
        /// Number of samples to keep in the output; values <= 0 keep all.
        output_steps: i64,
    },
    EquatorialPasses {
        frequency: UpdateFrequency,
    },
}

impl DiagnosticSpec {
    pub fn instantiate(&self) -> Box<dyn Diagnostic> {
        match *self {
            DiagnosticSpec::FourColorScreen { frequency } => Box::new(FourColorScreen {
                frequency,
                steps_since: 0,
                quadrant: 0,
            }),
            DiagnosticSpec::GeodesicPosition {
                frequency,
                output_steps,
            } => Box::new(GeodesicPosition {
                frequency,
                output_steps,
                steps_since: 0,
                samples: Vec::new(),
            }),
            DiagnosticSpec::EquatorialPasses { frequency } => Box::new(EquatorialPasses {
                frequency,
                steps_since: 0,
                passes: 0,
                prev_theta: -1.0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticSpec::FourColorScreen { .. } => "FourColorScreen",
            DiagnosticSpec::GeodesicPosition { .. } => "GeodesicPosition",
            DiagnosticSpec::EquatorialPasses { .. } => "EquatPasses",
        }
    }

    pub fn description(&self) -> String {
        self.instantiate().description()
    }
}

/// The ordered set of diagnostics the engine hands to each ray. The value
/// diagnostic is always first.
#[derive(Debug, Clone)]
pub struct DiagnosticsSpec {
    specs: Vec<DiagnosticSpec>,
}

impl DiagnosticsSpec {
    /// The first spec is the value diagnostic.
    pub fn new(specs: Vec<DiagnosticSpec>) -> Self {
        assert!(!specs.is_empty(), "at least one diagnostic is required");
        Self { specs }
    }

    pub fn instantiate(&self) -> Vec<Box<dyn Diagnostic>> {
        self.specs.iter().map(DiagnosticSpec::instantiate).collect()
    }

    /// A fresh instance of the value diagnostic (used by the mesh for its
    /// distance function).
    pub fn value_diagnostic(&self) -> Box<dyn Diagnostic> {
        self.specs[0].instantiate()
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.specs.iter().map(DiagnosticSpec::description).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// ---------------------------------------------------------------------
// FourColorScreen
// ---------------------------------------------------------------------

/// Assigns one of four colors based on the (theta, phi) quadrant where the
/// ray escaped through the boundary sphere. Rays that never escape keep the
/// default value 0.
pub struct FourColorScreen {
    frequency: UpdateFrequency,
    steps_since: u64,
    quadrant: u8,
}

impl Diagnostic for FourColorScreen {
    fn update(&mut self, ray: &RayState) {
        if !decide_update(&self.frequency, &mut self.steps_since, ray) {
            return;
        }
        if ray.termination != Term::BoundarySphere {
            return;
        }
        let theta = ray.pos[2];
        let phi = ray.pos[3].rem_euclid(2.0 * std::f64::consts::PI);
        self.quadrant = match (theta < std::f64::consts::FRAC_PI_2, phi < std::f64::consts::PI) {
            (true, true) => 1,
            (true, false) => 2,
            (false, true) => 3,
            (false, false) => 4,
        };
    }

    fn final_data_string(&self) -> String {
        self.quadrant.to_string()
    }

    fn final_data_value(&self) -> Vec<f64> {
        vec![f64::from(self.quadrant)]
    }

    fn distance(&self, val1: &[f64], val2: &[f64]) -> f64 {
        // Discrete metric: 0 when the quadrants agree, 1 otherwise.
        if (val1[0] - val2[0]).abs() < 1.0 {
            0.0
        } else {
            1.0
        }
    }

    fn name(&self) -> &'static str {
        "FourColorScreen"
    }

    fn description(&self) -> String {
        "Four-color screen".to_string()
    }
}

// ---------------------------------------------------------------------
// GeodesicPosition
// ---------------------------------------------------------------------

/// Accumulates position samples along the ray; on finish the sample list is
/// downsampled to at most `output_steps` entries with the last sample
/// forced into the result.
pub struct GeodesicPosition {
    frequency: UpdateFrequency,
    output_steps: i64,
    steps_since: u64,
    samples: Vec<Point>,
}

impl Diagnostic for GeodesicPosition {
    fn update(&mut self, ray: &RayState) {
        if decide_update(&self.frequency, &mut self.steps_since, ray) {
            self.samples.push(ray.pos);
        }

        if ray.termination != Term::Continue {
            let keep = self.output_steps;
            let n = self.samples.len();
            if keep > 0 && (keep as usize) < n {
                let stride = n / keep as usize;
                let mut kept: Vec<Point> = self
                    .samples
                    .iter()
                    .copied()
                    .step_by(stride)
                    .collect();
                // The final sample must survive the downsampling.
                if (n - 1) % stride != 0 {
                    kept.pop();
                    kept.push(self.samples[n - 1]);
                }
                self.samples = kept;
            }
        }
    }

    fn final_data_string(&self) -> String {
        let mut out = format!("{} ;; ", self.samples.len());
        for sample in &self.samples {
            for i in 0..4 {
                out.push_str(&format!("{} ", sample[i]));
            }
        }
        out
    }

    fn final_data_value(&self) -> Vec<f64> {
        match self.samples.last() {
            Some(last) => vec![last[2], last[3]],
            None => {
                warn!("GeodesicPosition has no samples; returning zero value");
                vec![0.0, 0.0]
            }
        }
    }

    fn distance(&self, val1: &[f64], val2: &[f64]) -> f64 {
        if val1.len() != 2 || val2.len() != 2 {
            warn!("GeodesicPosition::distance called with wrong-sized values");
            return 0.0;
        }
        // Planar Euclidean distance on the final (theta, phi) angles.
        let dt = val1[0] - val2[0];
        let dp = val1[1] - val2[1];
        (dt * dt + dp * dp).sqrt()
    }

    fn name(&self) -> &'static str {
        "GeodesicPosition"
    }

    fn description(&self) -> String {
        format!(
            "Geodesic position (output {} steps, updates every {} steps)",
            self.output_steps, self.frequency.n_steps
        )
    }
}

// ---------------------------------------------------------------------
// EquatorialPasses
// ---------------------------------------------------------------------

/// Counts sign changes of theta - pi/2 between consecutive samples.
pub struct EquatorialPasses {
    frequency: UpdateFrequency,
    steps_since: u64,
    passes: u64,
    /// Previous sampled theta. Starts at -1 so the first sample is never
    /// counted as a crossing.
    prev_theta: f64,
}

impl Diagnostic for EquatorialPasses {
    fn update(&mut self, ray: &RayState) {
        if !decide_update(&self.frequency, &mut self.steps_since, ray) {
            return;
        }
        let theta = ray.pos[2];
        let half_pi = std::f64::consts::FRAC_PI_2;
        if self.prev_theta > 0.0 && (self.prev_theta - half_pi) * (theta - half_pi) < 0.0 {
            self.passes += 1;
        }
        self.prev_theta = theta;
    }

    fn final_data_string(&self) -> String {
        self.passes.to_string()
    }

    fn final_data_value(&self) -> Vec<f64> {
        vec![self.passes as f64]
    }

    fn distance(&self, val1: &[f64], val2: &[f64]) -> f64 {
        (val1[0] - val2[0]).abs()
    }

    fn name(&self) -> &'static str {
        "EquatPasses"
    }

    fn description(&self) -> String {
        "Equatorial passes".to_string()
    }
}
