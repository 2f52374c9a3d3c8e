//! Logging setup.
//!
//! `EGGWARS_LOG` takes precedence over the verbosity level, using the
//! usual `EnvFilter` directive syntax (`eggwars_arena=debug,info`).

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter.
pub const LOG_ENV: &str = "EGGWARS_LOG";

/// Installs a `fmt` subscriber writing to stderr.
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Maps a `-v` count to a filter directive.
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
