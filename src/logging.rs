use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "floatdesk_lib=debug,floatdesk=debug,tauri=info";

/// Install the global fmt subscriber. `RUST_LOG` replaces the default filter.
/// Calling it twice is harmless; the second call is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
