//! Configuration: the TOML file layer and its resolution into a fully
//! specified [`EngineConfig`].
//!
//! Parsing is tolerant: every field has a documented default, unknown
//! fields are ignored, and every defect downgrades to a warning plus the
//! default. Only an unreadable or syntactically broken file is reported to
//! the caller, and even that is a clean (exit 0) shutdown at the CLI.

use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::constants::DEFAULT_BASE_STEP;
use crate::diagnostics::{DiagnosticSpec, UpdateFrequency};
use crate::geodesic::{IntegratorKind, TerminatorSpec};
use crate::metric::{FlatSpace, Kerr, Metric};
use crate::tensor::{OneIndex, PixelCoord, ScreenPoint};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse configuration file {path}: {source}")]
    Parse {
        path: String,
        source: Box<toml::de::Error>,
    },
}

/// Load and parse a configuration file.
pub fn load(path: impl AsRef<Path>) -> Result<ConfigFile, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

// ---------------------------------------------------------------------
// Raw file sections
// ---------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    #[serde(rename = "Metric")]
    pub metric: MetricSection,
    #[serde(rename = "Source")]
    pub source: SourceSection,
    #[serde(rename = "Diagnostics")]
    pub diagnostics: DiagnosticsSection,
    #[serde(rename = "Terminations")]
    pub terminations: TerminationsSection,
    #[serde(rename = "ViewScreen")]
    pub view_screen: ViewScreenSection,
    #[serde(rename = "Integrator")]
    pub integrator: IntegratorSection,
    #[serde(rename = "Output")]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetricSection {
    #[serde(rename = "Name")]
    pub name: String,
    pub a: f64,
    #[serde(rename = "RLogScale")]
    pub r_log_scale: bool,
}

impl Default for MetricSection {
    fn default() -> Self {
        Self {
            name: "kerr".into(),
            a: 0.5,
            r_log_scale: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    #[serde(rename = "Name")]
    pub name: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            name: "nosource".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSection {
    #[serde(rename = "FourColorScreen")]
    pub four_color_screen: DiagnosticEntry,
    #[serde(rename = "GeodesicPosition")]
    pub geodesic_position: GeodesicPositionEntry,
    #[serde(rename = "EquatorialPasses")]
    pub equatorial_passes: DiagnosticEntry,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagnosticEntry {
    #[serde(rename = "On")]
    pub on: bool,
    #[serde(rename = "UpdateFrequency")]
    pub update_frequency: u64,
    #[serde(rename = "UseForMesh")]
    pub use_for_mesh: bool,
}

impl Default for DiagnosticEntry {
    fn default() -> Self {
        Self {
            on: false,
            update_frequency: 1,
            use_for_mesh: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeodesicPositionEntry {
    #[serde(rename = "On")]
    pub on: bool,
    #[serde(rename = "UpdateFrequency")]
    pub update_frequency: u64,
    #[serde(rename = "UseForMesh")]
    pub use_for_mesh: bool,
    /// -1 keeps every sample.
    #[serde(rename = "OutputSteps")]
    pub output_steps: i64,
}

impl Default for GeodesicPositionEntry {
    fn default() -> Self {
        Self {
            on: false,
            update_frequency: 1,
            use_for_mesh: false,
            output_steps: -1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TerminationsSection {
    #[serde(rename = "Horizon")]
    pub horizon: HorizonEntry,
    #[serde(rename = "BoundarySphere")]
    pub boundary_sphere: BoundarySphereEntry,
    #[serde(rename = "TimeOut")]
    pub time_out: TimeOutEntry,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HorizonEntry {
    #[serde(rename = "On")]
    pub on: bool,
    #[serde(rename = "UpdateFrequency")]
    pub update_frequency: u64,
    #[serde(rename = "Epsilon_Horizon")]
    pub epsilon_horizon: f64,
}

impl Default for HorizonEntry {
    fn default() -> Self {
        Self {
            on: false,
            update_frequency: 1,
            epsilon_horizon: 0.01,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BoundarySphereEntry {
    #[serde(rename = "On")]
    pub on: bool,
    #[serde(rename = "UpdateFrequency")]
    pub update_frequency: u64,
    #[serde(rename = "SphereRadius")]
    pub sphere_radius: f64,
}

impl Default for BoundarySphereEntry {
    fn default() -> Self {
        Self {
            on: false,
            update_frequency: 1,
            sphere_radius: 1000.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeOutEntry {
    #[serde(rename = "On")]
    pub on: bool,
    #[serde(rename = "UpdateFrequency")]
    pub update_frequency: u64,
    #[serde(rename = "MaxSteps")]
    pub max_steps: u64,
}

impl Default for TimeOutEntry {
    fn default() -> Self {
        Self {
            on: false,
            update_frequency: 1,
            max_steps: 10_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ViewScreenSection {
    #[serde(rename = "Position")]
    pub position: FourVectorEntry,
    #[serde(rename = "Direction")]
    pub direction: FourVectorEntry,
    #[serde(rename = "ScreenSize")]
    pub screen_size: PairEntry,
    #[serde(rename = "ScreenCenter")]
    pub screen_center: PairEntry,
    #[serde(rename = "Mesh")]
    pub mesh: MeshSection,
}

impl Default for ViewScreenSection {
    fn default() -> Self {
        Self {
            position: FourVectorEntry {
                t: 0.0,
                r: 1000.0,
                theta: std::f64::consts::FRAC_PI_2,
                phi: 0.0,
            },
            direction: FourVectorEntry {
                t: 0.0,
                r: -1.0,
                theta: 0.0,
                phi: 0.0,
            },
            screen_size: PairEntry { x: 15.0, y: 15.0 },
            screen_center: PairEntry { x: 0.0, y: 0.0 },
            mesh: MeshSection::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FourVectorEntry {
    pub t: f64,
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PairEntry {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MeshSection {
    #[serde(rename = "Type")]
    pub mesh_type: String,
    #[serde(rename = "TotalPixels")]
    pub total_pixels: u64,
    #[serde(rename = "InitialPixels")]
    pub initial_pixels: u64,
    /// 0 means no total budget.
    #[serde(rename = "MaxPixels")]
    pub max_pixels: u64,
    #[serde(rename = "IterationPixels")]
    pub iteration_pixels: u64,
    #[serde(rename = "MaxSubdivide")]
    pub max_subdivide: u32,
    #[serde(rename = "InitialSubdivisionToFinal")]
    pub initial_subdivision_to_final: bool,
    /// Pixel list for InputCertainPixelsMesh, as [row, col] pairs.
    #[serde(rename = "Pixels")]
    pub pixels: Vec<[PixelCoord; 2]>,
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            mesh_type: "SimpleSquareMesh".into(),
            total_pixels: 10_000,
            initial_pixels: 10_000,
            max_pixels: 0,
            iteration_pixels: 2000,
            max_subdivide: 7,
            initial_subdivision_to_final: false,
            pixels: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegratorSection {
    #[serde(rename = "Type")]
    pub integrator_type: String,
    #[serde(rename = "StepSize")]
    pub step_size: f64,
}

impl Default for IntegratorSection {
    fn default() -> Self {
        Self {
            integrator_type: "rk4".into(),
            step_size: DEFAULT_BASE_STEP,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    #[serde(rename = "FilePrefix")]
    pub file_prefix: String,
    #[serde(rename = "FileExtension")]
    pub file_extension: String,
    #[serde(rename = "TimeStamp")]
    pub time_stamp: bool,
    #[serde(rename = "GeodesicToCache")]
    pub geodesics_to_cache: u64,
    #[serde(rename = "GeodesicsPerFile")]
    pub geodesics_per_file: u64,
    #[serde(rename = "FirstLineInfo")]
    pub first_line_info: bool,
    /// 0 = warnings only .. 4 = everything including debug.
    #[serde(rename = "ScreenOutputLevel")]
    pub screen_output_level: u8,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            file_prefix: "output".into(),
            file_extension: "dat".into(),
            time_stamp: true,
            geodesics_to_cache: 200_000,
            geodesics_per_file: 200_000,
            first_line_info: true,
            screen_output_level: 1,
        }
    }
}

// ---------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------

/// Which mesh to build, with its fully resolved parameters.
#[derive(Debug, Clone)]
pub enum MeshConfig {
    SimpleSquare {
        total_pixels: u64,
    },
    InputPixels {
        total_pixels: u64,
        pixels: Vec<(PixelCoord, PixelCoord)>,
    },
    SquareSubdivision {
        max_pixels: u64,
        initial_pixels: u64,
        max_subdivide: u32,
        iteration_pixels: u64,
        initial_subdivision_to_final: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ViewScreenConfig {
    pub position: OneIndex,
    pub direction: OneIndex,
    pub screen_size: ScreenPoint,
    pub screen_center: ScreenPoint,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub file_prefix: String,
    pub file_extension: String,
    pub time_stamp: bool,
    pub cache_limit: usize,
    pub geodesics_per_file: usize,
    pub first_line_info: bool,
    pub screen_output_level: u8,
}

/// The fully resolved engine configuration: every component named, every
/// option concrete, every default already substituted.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub metric: Metric,
    pub diagnostics: Vec<DiagnosticSpec>,
    pub terminators: Vec<TerminatorSpec>,
    pub view_screen: ViewScreenConfig,
    pub mesh: MeshConfig,
    pub integrator_kind: IntegratorKind,
    pub base_step: f64,
    pub output: OutputConfig,
}

impl ConfigFile {
    /// Resolve the raw file into an [`EngineConfig`], warning about and
    /// substituting defaults for every defect. Never fails.
    pub fn resolve(&self) -> EngineConfig {
        let metric = self.resolve_metric();
        self.check_source();
        let diagnostics = self.resolve_diagnostics();
        let terminators = self.resolve_terminators(&metric);
        let mesh = self.resolve_mesh();
        let (integrator_kind, base_step) = self.resolve_integrator();

        let vs = &self.view_screen;
        let view_screen = ViewScreenConfig {
            position: OneIndex::new([
                vs.position.t,
                vs.position.r,
                vs.position.theta,
                vs.position.phi,
            ]),
            direction: OneIndex::new([
                vs.direction.t,
                vs.direction.r,
                vs.direction.theta,
                vs.direction.phi,
            ]),
            screen_size: ScreenPoint::new(vs.screen_size.x, vs.screen_size.y),
            screen_center: ScreenPoint::new(vs.screen_center.x, vs.screen_center.y),
        };

        let out = &self.output;
        let output = OutputConfig {
            file_prefix: out.file_prefix.clone(),
            file_extension: out.file_extension.clone(),
            time_stamp: out.time_stamp,
            cache_limit: out.geodesics_to_cache as usize,
            geodesics_per_file: out.geodesics_per_file as usize,
            first_line_info: out.first_line_info,
            screen_output_level: out.screen_output_level,
        };

        EngineConfig {
            metric,
            diagnostics,
            terminators,
            view_screen,
            mesh,
            integrator_kind,
            base_step,
            output,
        }
    }

    fn resolve_metric(&self) -> Metric {
        match self.metric.name.to_lowercase().as_str() {
            "kerr" => Metric::Kerr(Kerr::new(self.metric.a, self.metric.r_log_scale)),
            "flatspace" => Metric::FlatSpace(FlatSpace),
            other => {
                warn!("unknown metric \"{other}\"; using default Kerr with a = 0.5");
                Metric::Kerr(Kerr::new(0.5, false))
            }
        }
    }

    fn check_source(&self) {
        if self.source.name.to_lowercase() != "nosource" {
            warn!(
                "unknown source \"{}\"; using default (no source)",
                self.source.name
            );
        }
    }

    /// Enabled diagnostics in their fixed order, with the value diagnostic
    /// rotated to the front. The value diagnostic is the first one marked
    /// UseForMesh; failing that FourColorScreen if present; failing that
    /// the first enabled diagnostic.
    fn resolve_diagnostics(&self) -> Vec<DiagnosticSpec> {
        let d = &self.diagnostics;
        let mut specs: Vec<(DiagnosticSpec, bool)> = Vec::new();

        if d.four_color_screen.on {
            specs.push((
                DiagnosticSpec::FourColorScreen {
                    frequency: UpdateFrequency {
                        n_steps: d.four_color_screen.update_frequency,
                        on_start: false,
                        on_finish: true,
                    },
                },
                d.four_color_screen.use_for_mesh,
            ));
        }
        if d.geodesic_position.on {
            specs.push((
                DiagnosticSpec::GeodesicPosition {
                    frequency: UpdateFrequency {
                        n_steps: d.geodesic_position.update_frequency,
                        on_start: false,
                        on_finish: false,
                    },
                    output_steps: d.geodesic_position.output_steps,
                },
                d.geodesic_position.use_for_mesh,
            ));
        }
        if d.equatorial_passes.on {
            specs.push((
                DiagnosticSpec::EquatorialPasses {
                    frequency: UpdateFrequency {
                        n_steps: d.equatorial_passes.update_frequency,
                        on_start: false,
                        on_finish: false,
                    },
                },
                d.equatorial_passes.use_for_mesh,
            ));
        }

        if specs.is_empty() {
            warn!("no diagnostics enabled; using default FourColorScreen");
            return vec![DiagnosticSpec::FourColorScreen {
                frequency: UpdateFrequency {
                    n_steps: 0,
                    on_start: false,
                    on_finish: true,
                },
            }];
        }

        let value_pos = specs.iter().position(|(_, use_for_mesh)| *use_for_mesh);
        let value_pos = match value_pos {
            Some(p) => p,
            None => {
                let fallback = specs
                    .iter()
                    .position(|(s, _)| matches!(s, DiagnosticSpec::FourColorScreen { .. }))
                    .unwrap_or(0);
                warn!(
                    "no mesh diagnostic set; using {}",
                    specs[fallback].0.name()
                );
                fallback
            }
        };
        // Move the value diagnostic to the front, keeping the rest in order.
        let value = specs.remove(value_pos);
        specs.insert(0, value);
        specs.into_iter().map(|(s, _)| s).collect()
    }

    /// Enabled terminators in registration order (Horizon, BoundarySphere,
    /// TimeOut). Horizon requires a horizon-bearing metric. An empty set
    /// falls back to BoundarySphere(1000) + TimeOut(10000).
    fn resolve_terminators(&self, metric: &Metric) -> Vec<TerminatorSpec> {
        let t = &self.terminations;
        let mut specs = Vec::new();

        if t.horizon.on {
            match metric.horizon() {
                Some(info) => specs.push(TerminatorSpec::Horizon {
                    radius: info.radius,
                    log_radial: info.log_radial,
                    epsilon: t.horizon.epsilon_horizon,
                    update_every_n_steps: t.horizon.update_frequency,
                }),
                None => warn!(
                    "Horizon termination requested but the metric has no horizon; termination omitted"
                ),
            }
        }
        if t.boundary_sphere.on {
            specs.push(TerminatorSpec::BoundarySphere {
                radius: t.boundary_sphere.sphere_radius,
                update_every_n_steps: t.boundary_sphere.update_frequency,
            });
        }
        if t.time_out.on {
            specs.push(TerminatorSpec::TimeOut {
                max_steps: t.time_out.max_steps,
                update_every_n_steps: t.time_out.update_frequency,
            });
        }

        if specs.is_empty() {
            warn!(
                "no terminations enabled; using default BoundarySphere(1000) + TimeOut(10000)"
            );
            specs.push(TerminatorSpec::BoundarySphere {
                radius: 1000.0,
                update_every_n_steps: 1,
            });
            specs.push(TerminatorSpec::TimeOut {
                max_steps: 10_000,
                update_every_n_steps: 1,
            });
        }
        specs
    }

    fn resolve_mesh(&self) -> MeshConfig {
        let m = &self.view_screen.mesh;
        match m.mesh_type.to_lowercase().as_str() {
            "simplesquaremesh" => MeshConfig::SimpleSquare {
                total_pixels: m.total_pixels,
            },
            "inputcertainpixelsmesh" => MeshConfig::InputPixels {
                total_pixels: m.total_pixels,
                pixels: m.pixels.iter().map(|p| (p[0], p[1])).collect(),
            },
            "squaresubdivisionmesh" => MeshConfig::SquareSubdivision {
                max_pixels: m.max_pixels,
                initial_pixels: m.initial_pixels,
                max_subdivide: m.max_subdivide,
                iteration_pixels: m.iteration_pixels,
                initial_subdivision_to_final: m.initial_subdivision_to_final,
            },
            other => {
                warn!("unknown mesh \"{other}\"; using default SimpleSquareMesh with 100x100 pixels");
                MeshConfig::SimpleSquare {
                    total_pixels: 10_000,
                }
            }
        }
    }

    fn resolve_integrator(&self) -> (IntegratorKind, f64) {
        let kind = match self.integrator.integrator_type.to_lowercase().as_str() {
            "rk4" => IntegratorKind::Rk4,
            other => {
                warn!("unknown integrator \"{other}\"; using RK4");
                IntegratorKind::Rk4
            }
        };
        let step = if self.integrator.step_size > 0.0 {
            self.integrator.step_size
        } else {
            warn!(
                "invalid integrator step size {}; using default {DEFAULT_BASE_STEP}",
                self.integrator.step_size
            );
            DEFAULT_BASE_STEP
        };
        (kind, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_resolves_to_documented_defaults() {
        let file: ConfigFile = toml::from_str("").unwrap();
        let cfg = file.resolve();

        match &cfg.metric {
            Metric::Kerr(k) => {
                assert_eq!(k.a(), 0.5);
                assert!(!k.log_radial());
            }
            other => panic!("expected Kerr default, got {other:?}"),
        }
        // No diagnostics on: FourColorScreen substituted.
        assert_eq!(cfg.diagnostics.len(), 1);
        assert!(matches!(
            cfg.diagnostics[0],
            DiagnosticSpec::FourColorScreen { .. }
        ));
        // No terminations on: BoundarySphere + TimeOut substituted.
        assert_eq!(cfg.terminators.len(), 2);
        assert!(matches!(
            cfg.terminators[0],
            TerminatorSpec::BoundarySphere { radius, .. } if radius == 1000.0
        ));
        assert!(matches!(
            cfg.terminators[1],
            TerminatorSpec::TimeOut { max_steps: 10_000, .. }
        ));
        assert!(matches!(cfg.mesh, MeshConfig::SimpleSquare { total_pixels: 10_000 }));
        assert_eq!(cfg.base_step, DEFAULT_BASE_STEP);
    }

    #[test]
    fn value_diagnostic_moves_to_front() {
        let toml_src = r#"
            [Diagnostics.FourColorScreen]
            On = true
            [Diagnostics.EquatorialPasses]
            On = true
            UseForMesh = true
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        let cfg = file.resolve();
        assert_eq!(cfg.diagnostics.len(), 2);
        assert!(matches!(
            cfg.diagnostics[0],
            DiagnosticSpec::EquatorialPasses { .. }
        ));
        assert!(matches!(
            cfg.diagnostics[1],
            DiagnosticSpec::FourColorScreen { .. }
        ));
    }

    #[test]
    fn horizon_on_flat_space_is_dropped() {
        let toml_src = r#"
            [Metric]
            Name = "flatspace"
            [Terminations.Horizon]
            On = true
            [Terminations.TimeOut]
            On = true
            MaxSteps = 500
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        let cfg = file.resolve();
        assert_eq!(cfg.terminators.len(), 1);
        assert!(matches!(
            cfg.terminators[0],
            TerminatorSpec::TimeOut { max_steps: 500, .. }
        ));
    }

    #[test]
    fn horizon_radius_comes_from_the_metric() {
        let toml_src = r#"
            [Metric]
            Name = "Kerr"
            a = 0.0
            [Terminations.Horizon]
            On = true
            Epsilon_Horizon = 0.02
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        let cfg = file.resolve();
        assert!(matches!(
            cfg.terminators[0],
            TerminatorSpec::Horizon { radius, epsilon, .. } if radius == 2.0 && epsilon == 0.02
        ));
    }

    #[test]
    fn subdivision_mesh_parameters_pass_through() {
        let toml_src = r#"
            [ViewScreen.Mesh]
            Type = "SquareSubdivisionMesh"
            InitialPixels = 16
            MaxPixels = 100
            IterationPixels = 4
            MaxSubdivide = 3
            InitialSubdivisionToFinal = true
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        let cfg = file.resolve();
        match cfg.mesh {
            MeshConfig::SquareSubdivision {
                max_pixels,
                initial_pixels,
                max_subdivide,
                iteration_pixels,
                initial_subdivision_to_final,
            } => {
                assert_eq!(max_pixels, 100);
                assert_eq!(initial_pixels, 16);
                assert_eq!(max_subdivide, 3);
                assert_eq!(iteration_pixels, 4);
                assert!(initial_subdivision_to_final);
            }
            other => panic!("expected subdivision mesh, got {other:?}"),
        }
    }

    #[test]
    fn unknown_names_fall_back_with_defaults() {
        let toml_src = r#"
            [Metric]
            Name = "wormhole"
            [Integrator]
            Type = "leapfrog"
            StepSize = -3.0
            [ViewScreen.Mesh]
            Type = "HexMesh"
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        let cfg = file.resolve();
        assert!(matches!(cfg.metric, Metric::Kerr(_)));
        assert_eq!(cfg.integrator_kind, IntegratorKind::Rk4);
        assert_eq!(cfg.base_step, DEFAULT_BASE_STEP);
        assert!(matches!(cfg.mesh, MeshConfig::SimpleSquare { .. }));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let toml_src = r#"
            SomeTopLevelThing = 3
            [Metric]
            Name = "kerr"
            a = 0.9
            FutureOption = "yes"
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        let cfg = file.resolve();
        assert!(matches!(cfg.metric, Metric::Kerr(k) if k.a() == 0.9));
    }
}
