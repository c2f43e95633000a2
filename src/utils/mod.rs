pub mod persistence;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "moneyguru_core=info";

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    init_tracing_with(None);
}

/// Same as [`init_tracing`], with an extra filter directive such as `Config::log_filter`.
/// Only the first call in a process installs anything.
pub fn init_tracing_with(directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        let mut rejected = Vec::new();
        for raw in [Some(DEFAULT_DIRECTIVE), directive].into_iter().flatten() {
            match raw.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(_) => rejected.push(raw.to_string()),
            }
        }
        // A subscriber installed by the host application wins.
        let _ = fmt().with_env_filter(filter).try_init();
        for raw in rejected {
            tracing::warn!(directive = %raw, "ignoring invalid log directive");
        }
        tracing::info!("moneyguru core tracing initialized.");
    });
}
