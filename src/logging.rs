use std::io;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "progress.log";

/// Keeps the non-blocking file writer flushing until dropped
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Non-blocking writer for a daily-rolling `progress.log` under `log_dir`,
/// creating the directory if needed
pub fn rolling_file_writer(log_dir: &Path) -> io::Result<(NonBlocking, FileLogGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((writer, FileLogGuard { _guard: guard }))
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// the replay output; a file layer is added when `config.file_logs` is set.
/// A log directory that cannot be created only disables the file layer.
pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(true);

    let file = if config.file_logs {
        rolling_file_writer(Path::new(&config.log_dir))
            .inspect_err(|err| {
                eprintln!("failed to create log directory {}: {err}", config.log_dir)
            })
            .ok()
    } else {
        None
    };

    let (file_layer, guard) = match file {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_file_writer_receives_events() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");

        let (writer, guard) = rolling_file_writer(&dir).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(writer).with_ansi(false));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(learner_id = "lee", "streak changed");
        });
        drop(guard);

        let files: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(LOG_FILE_PREFIX));

        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert!(contents.contains("streak changed"));
        assert!(contents.contains("learner_id=\"lee\""));
    }

    #[test]
    fn test_rolling_file_writer_reports_unusable_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        assert!(rolling_file_writer(&blocker.join("logs")).is_err());
    }
}
