use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `BFSCAN_LOG=debug`.
pub const LOG_ENV: &str = "BFSCAN_LOG";

/// Install a stderr subscriber filtered by `$BFSCAN_LOG`. Logging is off when
/// the variable is unset or invalid, so stderr only carries diagnostics.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
