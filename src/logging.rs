//! `tracing` subscriber setup.
//!
//! In the browser events go to the devtools console through `tracing-web`;
//! natively the regular fmt writer is used and `RUST_LOG` overrides the
//! requested level.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_LEVEL))
}

#[cfg(target_arch = "wasm32")]
fn install(level: &str) -> bool {
    let console = tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(tracing_web::MakeWebConsoleWriter::new());
    tracing_subscriber::registry()
        .with(filter(level))
        .with(console)
        .try_init()
        .is_ok()
}

#[cfg(not(target_arch = "wasm32"))]
fn install(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(level: &str) {
    if install(level) {
        tracing::debug!(level, "logging initialised");
    }
}
