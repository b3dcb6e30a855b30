//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level; `verbose` raises the crate's own level to debug.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let default_directive = if verbose {
        format!("{},mapquery=debug", config.level)
    } else {
        config.level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);

    // a second init (tests, repeated CLI setup) is not an error
    let _ = if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
}
