use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "budget_tracker=info";

/// Install a global `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to `budget_tracker=info` when `RUST_LOG` is unset or invalid.
/// Safe to call more than once; only the first call installs anything, and
/// a subscriber installed elsewhere is left in place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        if fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!("budget_tracker tracing initialized");
        }
    });
}
