use std::env;

use anyhow::Result;
use log::{info, LevelFilter};

use nullray::config;
use nullray::driver;
use nullray::engine::Engine;
use nullray::output::GeodesicOutputHandler;
use nullray::util;

/// Map the configured 0..4 verbosity onto log levels. RUST_LOG, when set,
/// takes precedence.
fn init_logging(screen_output_level: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        let level = match screen_output_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        builder.filter_level(level);
    }
    builder.init();
}

fn main() -> Result<()> {
    let Some(config_path) = env::args().nth(1) else {
        // Documented non-error shutdown: a missing argument is not a failure.
        eprintln!("usage: nullray <configuration-file>");
        return Ok(());
    };

    let file = match config::load(&config_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("exiting");
            return Ok(());
        }
    };

    init_logging(file.output.screen_output_level);
    info!("initializing all objects from {config_path}");

    let cfg = file.resolve();
    let mut engine = Engine::from_config(&cfg);
    engine.log_components();

    let time_stamp = if cfg.output.time_stamp {
        util::timestamp_string()
    } else {
        String::new()
    };
    let first_line_info = cfg
        .output
        .first_line_info
        .then(|| engine.first_line_info());
    let sink = GeodesicOutputHandler::new(
        cfg.output.file_prefix.clone(),
        time_stamp,
        cfg.output.file_extension.clone(),
        engine.diag_names(),
        cfg.output.cache_limit,
        cfg.output.geodesics_per_file,
        first_line_info,
    );

    driver::run(&mut engine, &sink);

    info!("nullray finished");
    Ok(())
}
