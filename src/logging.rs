//! Diagnostic logging to stderr.
//!
//! Library code logs through `tracing` macros; the `psearch` binary installs
//! the subscriber once at startup. Command output proper goes to stdout and
//! is never routed through here.
//!
//! The filter comes from `PSEARCH_LOG`, then `RUST_LOG`, then defaults to
//! `warn,hyper=warn,reqwest=warn`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "PSEARCH_LOG";

const DEFAULT_FILTER: &str = "warn,hyper=warn,reqwest=warn";

/// Installs the stderr subscriber. Calling it twice is harmless.
pub fn init() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
