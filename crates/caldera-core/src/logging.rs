use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise everything from the engine is
/// logged at `debug` and dependencies at `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caldera=debug,caldera_jobs=debug,caldera_assets=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
