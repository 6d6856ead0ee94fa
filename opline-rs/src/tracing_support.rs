//! Subscriber setup for hosts that embed the registry.
//!
//! The library itself only emits `tracing` events: `info` when commands are
//! registered or removed, `debug` during dispatch, and `warn` for diagnostics
//! through [`TracingDiagnosticSink`](crate::diagnostics::TracingDiagnosticSink).
//! These helpers install a formatting subscriber for applications that do not
//! have one yet.

pub use tracing::{self, debug, error, info, instrument, trace, warn};

#[cfg(feature = "tracing")]
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, util::TryInitError,
    EnvFilter, Layer,
};

/// Tracing output format.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,

    /// One line per event.
    Compact,

    /// Newline-delimited JSON.
    Json,
}

/// Tracing configuration.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter.
    ///
    /// If None, uses RUST_LOG environment variable or defaults to "info".
    pub level: Option<tracing::Level>,

    pub format: TracingFormat,

    pub timestamps: bool,

    /// Include target module names in output.
    pub target: bool,

    pub thread_ids: bool,
}

#[cfg(feature = "tracing")]
impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::default(),
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "tracing")]
impl TracingConfig {
    fn filter(&self) -> EnvFilter {
        match self.level {
            Some(level) => EnvFilter::new(level.to_string()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        }
    }
}

#[cfg(feature = "tracing")]
fn fmt_layer<S>(config: &TracingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.target)
        .with_thread_ids(config.thread_ids);

    match (config.format, config.timestamps) {
        (TracingFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingFormat::Compact, true) => layer.compact().boxed(),
        (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingFormat::Json, true) => layer.json().boxed(),
        (TracingFormat::Json, false) => layer.json().without_time().boxed(),
    }
}

/// Install a global subscriber with default settings.
///
/// Does nothing if the process already has one.
///
/// # Environment Variables
///
/// - `RUST_LOG=debug` - include dispatch resolution
/// - `RUST_LOG=opline=debug,myapp=info` - per-module filtering
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    init_subscriber_with_config(TracingConfig::default());
}

/// Install a global subscriber built from `config`.
///
/// Does nothing if the process already has one.
///
/// ```
/// use opline::tracing_support::{init_subscriber_with_config, TracingConfig, TracingFormat};
///
/// init_subscriber_with_config(TracingConfig {
///     format: TracingFormat::Json,
///     timestamps: false,
///     ..Default::default()
/// });
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) {
    if try_init_subscriber_with_config(config).is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// Like [`init_subscriber_with_config`], reporting an existing subscriber as
/// an error.
#[cfg(feature = "tracing")]
pub fn try_init_subscriber_with_config(config: TracingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt_layer::<tracing_subscriber::Registry>(&config))
        .with(config.filter())
        .try_init()
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}
