//! Logging setup for the command line runner.
//!
//! Logs go to stderr so that `--rows` output on stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `pgsqlexec=debug` with `--verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "warn,pgsqlexec=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
