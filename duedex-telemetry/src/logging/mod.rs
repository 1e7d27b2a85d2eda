//! Structured logging setup.
//!
//! Provides configurable logging with support for:
//! - JSON and pretty-print formats
//! - Stdout and rolling file targets
//! - `RUST_LOG` filter overrides

mod config;

pub use config::{LogConfig, LogFormat, LogOutput, RotationConfig};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Initialize the global subscriber with the given configuration.
///
/// Returns the file writer guards; keep them alive until shutdown so buffered
/// lines are flushed.
///
/// ```no_run
/// use duedex_telemetry::logging::{LogConfig, init_logging};
///
/// let _guards = init_logging(&LogConfig::default()).expect("logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<Vec<WorkerGuard>, LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| LoggingError::InvalidConfig(format!("level '{}': {e}", config.level)))?,
    };

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer<_>> = Vec::new();

    for output in &config.outputs {
        match output {
            LogOutput::Stdout => layers.push(format_layer(config, std::io::stdout)),
            LogOutput::File {
                path,
                prefix,
                rotation,
            } => {
                std::fs::create_dir_all(path)?;
                let appender = file_appender(path, prefix, rotation.unwrap_or(RotationConfig::Daily));
                let (writer, guard) = tracing_appender::non_blocking(appender);
                layers.push(format_layer(config, writer));
                guards.push(guard);
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guards)
}

fn format_layer<S, W>(config: &LogConfig, writer: W) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info);

    match config.format {
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

fn file_appender(path: &str, prefix: &str, rotation: RotationConfig) -> RollingFileAppender {
    match rotation {
        RotationConfig::Hourly => tracing_appender::rolling::hourly(path, prefix),
        RotationConfig::Daily => tracing_appender::rolling::daily(path, prefix),
        RotationConfig::Never => tracing_appender::rolling::never(path, prefix),
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid logging configuration: {0}")]
    InvalidConfig(String),

    /// A global subscriber was already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            level: "duedex=verbose".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_file_output_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let config = LogConfig {
            outputs: vec![LogOutput::File {
                path: log_dir.display().to_string(),
                prefix: "test.log".to_string(),
                rotation: Some(RotationConfig::Never),
            }],
            ..LogConfig::default()
        };

        // A second global init in the same test binary fails; the directory is created either way.
        let _ = init_logging(&config);
        assert!(log_dir.is_dir());
    }
}
