//! Logging setup
//!
//! Events go to stderr so stdout carries nothing but the result CSV.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the log filter: explicit value first, then `RUST_LOG`, then `warn`
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|e| {
            eprintln!("Invalid log filter '{}' ({}), using '{}'", level, e, DEFAULT_FILTER);
            EnvFilter::new(DEFAULT_FILTER)
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Install the global subscriber
///
/// Calling it again is a no-op.
pub fn setup_logging(level: Option<&str>) {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_ansi(is_terminal)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = ?level, "logging initialized");
    }
}
