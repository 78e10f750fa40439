//! Structured logging initialization via `tracing`.

/// Output format for log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for interactive use.
    Human,
    /// JSON lines for log collectors.
    Json,
}

/// Initialize the tracing subscriber with sensible defaults.
///
/// Respects the `RUST_LOG` environment variable for filtering. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing() {
    init_tracing_with(LogFormat::Human);
}

/// Initialize the tracing subscriber with an explicit output format.
pub fn init_tracing_with(format: LogFormat) {
    use tracing_subscriber::EnvFilter;
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    let result = match format {
        LogFormat::Human => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    // A subscriber may already be installed (e.g. by a test harness).
    let _ = result;
}
