//! Logging setup for binaries and test harnesses embedding the crate.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs a compact fmt subscriber.
///
/// `verbosity` 0 logs warnings, 1 info, 2 debug, 3+ trace. `RUST_LOG`
/// takes precedence when set. Calling this more than once is harmless: only
/// the first subscriber is installed.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xdg_menu_tree={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .try_init();
}
