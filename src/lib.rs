//! # nullray -- General-Relativistic Ray Tracer
//!
//! Integrates null geodesics backward from a virtual camera through a curved
//! spacetime, recording per-ray diagnostics. Pixels on the virtual screen
//! parametrize initial directions; an adaptive subdivision mesh concentrates
//! rays where neighboring diagnostics disagree the most, so features like
//! shadow edges get resolved without paying for the whole screen.
//!
//! ## Quick Start
//!
//! ```rust
//! use nullray::prelude::*;
//!
//! // A Kerr black hole with spin 0.5, standard radial coordinate.
//! let metric = Metric::Kerr(Kerr::new(0.5, false));
//!
//! // The metric and its connection at a point.
//! let p = OneIndex::new([0.0, 10.0, std::f64::consts::FRAC_PI_2, 0.0]);
//! let g = metric.metric_dd(&p);
//! let gamma = metric.christoffel_udd(&p);
//! assert!(g[0][0] < 0.0 && gamma[1][2][2] != 0.0);
//! ```
//!
//! ## Architecture
//!
//! - [`tensor`] -- Fixed-rank tensors over the 4D spacetime index
//! - [`metric`] -- Spacetime geometries: Kerr, flat space
//! - [`geodesic`] -- Integrator, terminators, and the per-ray actor
//! - [`diagnostics`] -- Per-ray observers (the open extension point)
//! - [`mesh`] -- Pixel scheduling, including adaptive square subdivision
//! - [`viewscreen`] -- Pixel coordinates to physical initial conditions
//! - [`driver`] -- Parallel fan-out per mesh iteration
//! - [`output`] -- Thread-safe, batched per-diagnostic file output
//! - [`config`] / [`engine`] -- Configuration file to a ready engine

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod driver;
pub mod engine;
pub mod geodesic;
pub mod mesh;
pub mod metric;
pub mod output;
pub mod tensor;
pub mod util;
pub mod viewscreen;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{ConfigFile, EngineConfig};
    pub use crate::diagnostics::{Diagnostic, DiagnosticSpec, DiagnosticsSpec, UpdateFrequency};
    pub use crate::engine::Engine;
    pub use crate::geodesic::{
        Geodesic, Integrator, IntegratorKind, Source, Term, TerminatorSpec, TerminatorsSpec,
    };
    pub use crate::mesh::Mesh;
    pub use crate::metric::{FlatSpace, Kerr, Metric};
    pub use crate::output::GeodesicOutputHandler;
    pub use crate::tensor::{OneIndex, Point, ScreenIndex, ScreenPoint, TwoIndex};
    pub use crate::viewscreen::ViewScreen;
}
