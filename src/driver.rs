//! The iteration driver: parallel fan-out over each mesh iteration.
//!
//! Rays are embarrassingly parallel, so each iteration is a rayon fan-out
//! over the queued pixels. One [`Geodesic`] actor lives per worker thread
//! and is reset between pixels. The mesh ingests final values after the
//! join barrier, in pixel order, so results are bitwise identical for any
//! thread count; output records go to the sink's pre-sized slots straight
//! from the workers.

use std::cell::RefCell;
use std::time::Instant;

use log::info;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thread_local::ThreadLocal;

use crate::engine::Engine;
use crate::geodesic::Geodesic;
use crate::output::GeodesicOutputHandler;

/// Run the engine to completion, feeding the sink as rays finish.
pub fn run(engine: &mut Engine, sink: &GeodesicOutputHandler) {
    let total_timer = Instant::now();

    while !engine.viewscreen.finished() {
        let count = engine.viewscreen.current_count();
        sink.prepare_for_output(count);
        info!(
            "integrating {count} geodesics on {} threads",
            rayon::current_num_threads()
        );
        let iteration_timer = Instant::now();

        let metric = &engine.metric;
        let source = &engine.source;
        let integrator = engine.integrator;
        let diagnostics = &engine.diagnostics;
        let terminators = &engine.terminators;
        let viewscreen = &engine.viewscreen;

        let actors: ThreadLocal<RefCell<Geodesic>> = ThreadLocal::new();

        let final_values: Vec<Vec<f64>> = (0..count)
            .into_par_iter()
            .map(|index| {
                let actor = actors.get_or(|| {
                    RefCell::new(Geodesic::new(
                        metric,
                        source,
                        integrator,
                        diagnostics,
                        terminators,
                    ))
                });
                let mut geodesic = actor.borrow_mut();

                let (pos, vel, screen_index) = viewscreen.initial_conditions_for(index, metric);
                geodesic.reset(screen_index, pos, vel);
                geodesic.run_to_termination();

                sink.submit(index, geodesic.final_record());
                geodesic.final_value()
            })
            .collect();

        for (index, values) in final_values.into_iter().enumerate() {
            engine.viewscreen.geodesic_finished(index as u64, values);
        }
        engine.viewscreen.end_current_loop();

        info!(
            "integration loop done in {:.2}s; total elapsed {:.2}s",
            iteration_timer.elapsed().as_secs_f64(),
            total_timer.elapsed().as_secs_f64()
        );
    }

    info!(
        "all integration finished; total time elapsed {:.2}s",
        total_timer.elapsed().as_secs_f64()
    );
    sink.finalize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::mesh::Mesh;

    fn quiet_sink(dir: &std::path::Path) -> GeodesicOutputHandler {
        GeodesicOutputHandler::new(
            dir.join("out").to_string_lossy().into_owned(),
            "",
            "dat",
            vec!["FourColorScreen".into()],
            100_000,
            100_000,
            None,
        )
    }

    #[test]
    fn run_is_deterministic_across_thread_counts() {
        let toml_src = r#"
            [Metric]
            Name = "kerr"
            a = 0.5
            [Diagnostics.FourColorScreen]
            On = true
            UseForMesh = true
            [Terminations.Horizon]
            On = true
            [Terminations.BoundarySphere]
            On = true
            SphereRadius = 30.0
            [Terminations.TimeOut]
            On = true
            MaxSteps = 100000
            [ViewScreen]
            Position = { t = 0.0, r = 25.0, theta = 1.4, phi = 0.0 }
            ScreenSize = { x = 24.0, y = 24.0 }
            [ViewScreen.Mesh]
            Type = "SquareSubdivisionMesh"
            InitialPixels = 16
            MaxSubdivide = 3
            IterationPixels = 2
            MaxPixels = 40
        "#;

        let run_with_threads = |threads: usize| -> Vec<(u64, u64, u32, f64)> {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            pool.install(|| {
                let dir = tempfile::tempdir().unwrap();
                let file: ConfigFile = toml::from_str(toml_src).unwrap();
                let mut engine = Engine::from_config(&file.resolve());
                let sink = quiet_sink(dir.path());
                run(&mut engine, &sink);

                let Mesh::SquareSubdivision(mesh) = engine.viewscreen.mesh() else {
                    panic!("expected the subdivision mesh");
                };
                mesh.all_pixels()
                    .iter()
                    .map(|p| {
                        (
                            p.index.row,
                            p.index.col,
                            p.subdivide_level,
                            p.diag_value.first().copied().unwrap_or(-1.0),
                        )
                    })
                    .collect()
            })
        };

        let single = run_with_threads(1);
        let multi = run_with_threads(4);
        assert!(!single.is_empty());
        assert_eq!(single, multi);
    }
}
