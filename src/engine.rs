//! The assembled engine: every component built from an [`EngineConfig`],
//! ready for the iteration driver.

use log::info;

use crate::config::{EngineConfig, MeshConfig};
use crate::diagnostics::DiagnosticsSpec;
use crate::geodesic::{Integrator, Source, TerminatorsSpec};
use crate::mesh::{InputPixelsMesh, Mesh, SimpleSquareMesh, SquareSubdivisionMesh};
use crate::metric::Metric;
use crate::viewscreen::{GeodesicType, ViewScreen};

/// A ready-to-run engine. The metric, source, integrator, and the
/// diagnostic/terminator specs are shared by reference with every ray; the
/// viewscreen owns the mesh.
pub struct Engine {
    pub metric: Metric,
    pub source: Source,
    pub integrator: Integrator,
    pub diagnostics: DiagnosticsSpec,
    pub terminators: TerminatorsSpec,
    pub viewscreen: ViewScreen,
}

impl Engine {
    pub fn from_config(config: &EngineConfig) -> Self {
        let metric = config.metric.clone();
        let source = Source::None;
        let integrator = Integrator::new(config.integrator_kind, config.base_step);
        let diagnostics = DiagnosticsSpec::new(config.diagnostics.clone());
        let terminators = TerminatorsSpec(config.terminators.clone());

        let mesh = match &config.mesh {
            MeshConfig::SimpleSquare { total_pixels } => {
                Mesh::SimpleSquare(SimpleSquareMesh::new(*total_pixels))
            }
            MeshConfig::InputPixels {
                total_pixels,
                pixels,
            } => Mesh::InputPixels(InputPixelsMesh::new(*total_pixels, pixels.clone())),
            MeshConfig::SquareSubdivision {
                max_pixels,
                initial_pixels,
                max_subdivide,
                iteration_pixels,
                initial_subdivision_to_final,
            } => Mesh::SquareSubdivision(SquareSubdivisionMesh::new(
                *max_pixels,
                *initial_pixels,
                *max_subdivide,
                *iteration_pixels,
                *initial_subdivision_to_final,
                diagnostics.value_diagnostic(),
            )),
        };

        let vs = &config.view_screen;
        let viewscreen = ViewScreen::new(
            vs.position,
            vs.direction,
            vs.screen_size,
            vs.screen_center,
            GeodesicType::Null,
            mesh,
            &metric,
        );

        Self {
            metric,
            source,
            integrator,
            diagnostics,
            terminators,
            viewscreen,
        }
    }

    /// Names of the enabled diagnostics, in output order.
    pub fn diag_names(&self) -> Vec<String> {
        self.diagnostics.names()
    }

    /// The descriptive line written at the top of every output file.
    pub fn first_line_info(&self) -> String {
        format!(
            "Metric: {}; Source: {}; Diagnostics: {}; Terminations: {}; {}; {}",
            self.metric.description(),
            self.source.description(),
            self.diagnostics.descriptions().join(", "),
            self.terminators.descriptions().join(", "),
            self.viewscreen.description(),
            self.integrator.description(),
        )
    }

    /// Log every initialized component at Info level.
    pub fn log_components(&self) {
        info!("--------------------------------");
        info!("list of all initialized objects:");
        info!("Metric: {}", self.metric.description());
        info!("Geodesic source: {}", self.source.description());
        for d in self.diagnostics.descriptions() {
            info!("Diagnostic: {d}");
        }
        for t in self.terminators.descriptions() {
            info!("Termination: {t}");
        }
        info!("{}", self.viewscreen.description());
        info!("{}", self.integrator.description());
        info!("--------------------------------");
    }
}
