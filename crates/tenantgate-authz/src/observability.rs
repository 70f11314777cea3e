//! Tracing setup for binaries embedding the engine.
//!
//! # Notes
//! The library only emits `tracing` events and `metrics` counters. Installing
//! a subscriber (and any metrics exporter) is the host process's job; this
//! helper covers the common case. Initialization is guarded by `OnceLock` so
//! repeated calls in tests are harmless.
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
        tracing::debug!(service = service_name, "tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing("tenantgate-test");
        init_tracing("tenantgate-test");
        assert!(TRACING_INIT.get().is_some());
    }
}
