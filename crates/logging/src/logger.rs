//! Subscriber bootstrap
//!
//! Installs the process-wide `tracing` subscriber from [`LoggingSettings`].

use anyhow::{Context, Result};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use orchestration_config::{LogFormat, LoggingSettings};

/// Initializes logging
///
/// `RUST_LOG` takes precedence over the configured level. When a log directory
/// is configured a daily rolling JSON file is written as well, and the returned
/// guard must be held for as long as logs should be flushed. Calling this when a
/// subscriber is already installed is not an error.
pub fn init_logging(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .with_context(|| format!("invalid log filter '{}'", settings.level))?;

    let (file_layer, guard) = match &settings.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("cannot create log directory {}", directory.display()))?;
            let appender = tracing_appender::rolling::daily(directory, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = match settings.format {
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => Ok(guard),
        Err(e) => {
            debug!("Logging already initialized: {}", e);
            Ok(None)
        }
    }
}
