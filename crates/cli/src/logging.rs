//! Log subscriber for the CLI. Logs go to stderr; stdout carries results.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
const LOG_ENV: &str = "NEWTON_LOG";

pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
