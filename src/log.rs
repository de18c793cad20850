//! Logging initialization.

use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Log to stderr at `warn`, or `debug` for gradfund itself when `verbose`.
/// `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let directives = if verbose { "warn,gradfund=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(env_filter)
        .try_init();
}
