//! Tracing initialization.

/// Install a formatted tracing subscriber honoring `RUST_LOG`, defaulting to
/// INFO. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}
