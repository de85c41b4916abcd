//! Logging initialization
//!
//! Console output is plain text or JSON; optional file output is always JSON,
//! written through a non-blocking rolling appender. `RUST_LOG` overrides the
//! configured level.

use crate::config::LoggingConfig;
use anyhow::Context;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the file writer flushing until dropped. Hold it for the life of `main`.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let console_json = config.json.then(|| fmt::layer().json().with_target(true));
    let console_text = (!config.json).then(|| fmt::layer().with_target(true));

    let (file_layer, file_guard) = if config.file_enabled {
        let appender = RollingFileAppender::new(
            parse_rotation(&config.file_rotation)?,
            &config.file_directory,
            &config.file_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if config.file_enabled {
        tracing::info!(
            directory = %config.file_directory,
            prefix = %config.file_prefix,
            rotation = %config.file_rotation,
            "File logging enabled"
        );
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn parse_rotation(value: &str) -> anyhow::Result<Rotation> {
    match value {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "minutely" => Ok(Rotation::MINUTELY),
        "never" => Ok(Rotation::NEVER),
        other => anyhow::bail!("Unknown log rotation '{other}'"),
    }
}
