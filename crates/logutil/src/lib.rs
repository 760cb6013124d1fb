//! Utilities for logging.
//!
//! Libraries in this workspace only emit `tracing` events, the subscriber is
//! installed here.
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn env_filter(default_level: Level) -> EnvFilter {
    // HTTP internals are far too chatty below info.
    let mut filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    for directive in ["h2=info", "hyper=info", "hyper_util=info", "reqwest=info", "rustls=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Logging for tests, captured by the test harness.
///
/// Honors `RUST_LOG` when set, defaults to debug. Does nothing if a
/// subscriber has already been installed.
pub fn init_test() {
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::DEBUG))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
