//! `tracing` subscriber setup.

use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{TelemetryError, TelemetryResult};

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-oriented.
    Pretty,
    /// Single-line, human-oriented.
    Compact,
    /// Single-line JSON, for log aggregators.
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// Daily-rotated files under `directory`, named with `file_name_prefix`.
    File {
        /// Directory the rotated files are written into.
        directory: PathBuf,
        /// Prefix for each day's file name.
        file_name_prefix: String,
    },
}

/// Logging setup: base level, output format, destination, and additional
/// per-module directives layered on top of the base level.
///
/// Grounded on `astrid_telemetry::logging::LogConfig`'s chained
/// `with_*(mut self, ...) -> Self` shape.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    format: LogFormat,
    target: LogTarget,
    directives: Vec<String>,
}

impl LogConfig {
    /// A config at the given base level (e.g. `"info"`, `"debug"`), writing
    /// pretty-formatted lines to stdout.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Pretty,
            target: LogTarget::Stdout,
            directives: Vec::new(),
        }
    }

    /// Override the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Override the output destination.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Append a per-module `EnvFilter` directive (e.g. `"agentic_plan=trace"`).
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(format!("invalid level '{}': {e}", self.level)))?;
        for directive in &self.directives {
            let parsed = directive
                .parse()
                .map_err(|e| TelemetryError::ConfigError(format!("invalid directive '{directive}': {e}")))?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::ConfigError`] if `config`'s level or
/// directives don't parse, or [`TelemetryError::InitError`] if a global
/// subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;

    match &config.target {
        LogTarget::Stdout => {
            let layer = fmt_layer(config.format, std::io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .map_err(|e| TelemetryError::InitError(e.to_string()))
        }
        LogTarget::Stderr => {
            let layer = fmt_layer(config.format, std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .map_err(|e| TelemetryError::InitError(e.to_string()))
        }
        LogTarget::File {
            directory,
            file_name_prefix,
        } => {
            let appender = tracing_appender::rolling::daily(directory, file_name_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            // The writer must outlive the subscriber for the life of the
            // process; there is no "undo setup_logging" operation to give
            // the guard back to, so it is leaked deliberately.
            Box::leak(Box::new(guard));
            let layer = fmt_layer(config.format, non_blocking);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .map_err(|e| TelemetryError::InitError(e.to_string()))
        }
    }
}

/// Install a global subscriber at `info` level, writing pretty lines to
/// stdout — the common case for examples and integration tests.
///
/// # Errors
///
/// See [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::new("info"))
}

fn fmt_layer<S, W>(
    format: LogFormat,
    writer: W,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
