//! Subscriber setup for the engine's `tracing` output.
//!
//! The engine only emits events; binaries and test harnesses decide where
//! they go. `RUST_LOG` wins over the directive passed in.

use tracing_subscriber::EnvFilter;

/// Default directive: engine debug output, everything else at `warn`
pub const DEFAULT_DIRECTIVE: &str = "warn,locus=debug";

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a human-readable subscriber.
///
/// Returns `false` when a global subscriber was already set, so repeated
/// calls from several tests are harmless.
pub fn init_logging(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install a JSON-lines subscriber for CI log collection
pub fn init_json_logging(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_directive))
        .with_current_span(false)
        .try_init()
        .is_ok()
}
