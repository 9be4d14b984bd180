//! Structured logging using **tracing**.
//!
//! Events go to stderr as JSON so stdout stays clean for `--json` reports.
//! Classification emits one `debug!` event per skipped occurrence, so the
//! default filter is `warn` and `--verbose` raises it to `debug`.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initializes the global tracing subscriber.
///
/// Call once at startup. A second call is ignored.
///
/// # Environment Variables
/// - `RUST_LOG`: overrides the default filter (e.g. `RUST_LOG=deadstore_core=trace`)
pub fn init_structured_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
