//! Telemetry setup

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::AppError;

/// Installs the global subscriber: stdout in the configured format plus an
/// optional daily rolling file. `RUST_LOG` takes precedence over `settings.level`.
///
/// File output goes through a background writer; keep the returned guard
/// alive until shutdown so buffered lines are flushed.
pub fn init_telemetry(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| AppError::TelemetryError(e.to_string()))?;

    let (file_writer, guard) = match file_writer(settings)? {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match settings.format.as_str() {
        "pretty" => registry
            .with(fmt::layer().pretty().with_target(true))
            .with(file_writer.map(|w| fmt::layer().with_writer(w).with_ansi(false)))
            .try_init(),
        _ => registry
            .with(fmt::layer().json().with_target(true).with_level(true))
            .with(file_writer.map(|w| fmt::layer().json().with_writer(w)))
            .try_init(),
    };

    result.map_err(|e| AppError::TelemetryError(e.to_string()))?;
    Ok(guard)
}

/// Daily `bizhub.*.log` files under `settings.directory`, written off the
/// calling thread. `None` when file logging is disabled.
fn file_writer(settings: &LoggingSettings) -> Result<Option<(NonBlocking, WorkerGuard)>, AppError> {
    if settings.directory.is_empty() {
        return Ok(None);
    }

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("bizhub")
        .filename_suffix("log")
        .build(&settings.directory)
        .map_err(|e| AppError::TelemetryError(e.to_string()))?;

    Ok(Some(tracing_appender::non_blocking(appender)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use uuid::Uuid;

    use super::*;

    fn settings(directory: &str) -> LoggingSettings {
        LoggingSettings {
            level: "info".into(),
            format: "json".into(),
            directory: directory.into(),
        }
    }

    #[test]
    fn test_file_logging_disabled_without_directory() {
        assert!(file_writer(&settings("")).unwrap().is_none());
    }

    #[test]
    fn test_file_lines_are_flushed_when_guard_drops() {
        let dir = std::env::temp_dir().join(format!("bizhub-telemetry-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let (mut writer, guard) = file_writer(&settings(dir.to_str().unwrap())).unwrap().unwrap();
        writer.write_all(b"{\"msg\":\"contract expired\"}\n").unwrap();
        drop(writer);
        drop(guard);

        let contents: String = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.file_name().is_some_and(|n| n.to_string_lossy().starts_with("bizhub")))
            .map(|path| std::fs::read_to_string(path).unwrap())
            .collect();
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(contents.contains("contract expired"));
    }
}
