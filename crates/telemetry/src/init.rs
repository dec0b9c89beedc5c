// Path: crates/telemetry/src/init.rs
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initializes the global `tracing` subscriber.
///
/// Output goes to stderr, as JSON lines when `json` is set. The filter defaults to
/// `info` and is overridden by `RUST_LOG`. Records emitted through the `log` facade,
/// such as wasmtime's, are forwarded to the same subscriber.
pub fn init_tracing(json: bool) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = Registry::default().with(filter);
    tracing_log::LogTracer::init()?;
    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        tracing::subscriber::set_global_default(registry.with(fmt_layer))?;
    } else {
        let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        tracing::subscriber::set_global_default(registry.with(fmt_layer))?;
    }
    Ok(())
}
