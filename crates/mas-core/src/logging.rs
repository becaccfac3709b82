//! Logging initialization for the surveillance core.
//!
//! All log output goes to stderr; stdout stays reserved for payloads.
//! The filter reads `MAS_LOG` (falling back to `RUST_LOG`, then to
//! `info`). Safe to call more than once: only the first call installs
//! a subscriber, which keeps tests that each require logging from
//! fighting over the global dispatcher.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_env("MAS_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}
