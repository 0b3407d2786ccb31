//! Logging setup.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Daily rolling log file: `<dir>/<prefix>.<YYYY-MM-DD>`.
#[derive(Debug, Clone, Copy)]
pub struct LogFile<'a> {
    pub dir: &'a Path,
    pub prefix: &'a str,
}

/// Setup logging with the given level.
///
/// `RUST_LOG` overrides `level` when set. With a `file`, events are also
/// written without ANSI colors to a daily rolling file; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn setup_logging(level: &str, json: bool, file: Option<LogFile<'_>>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match file {
        Some(log) => {
            let appender = tracing_appender::rolling::daily(log.dir, log.prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }

    guard
}

/// Delete log files starting with `prefix` from `dir`.
///
/// A missing directory counts as already clean.
pub fn remove_log_files(dir: &Path, prefix: &str) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let is_log = entry.file_name().to_string_lossy().starts_with(prefix);
        if is_log && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            debug!(file = %entry.path().display(), "Removed log file");
            removed += 1;
        }
    }
    info!(removed, dir = %dir.display(), "Log files removed");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cleanup_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("screener.log.2024-06-01"), "old").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = fmt::Subscriber::builder()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let removed = tracing::subscriber::with_default(subscriber, || {
            remove_log_files(dir.path(), "screener.log").unwrap()
        });

        assert_eq!(removed, 1);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Log files removed"));
        assert!(output.contains("removed=1"));
    }

    #[test]
    fn test_remove_log_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("screener.log.2024-06-01"), "old").unwrap();
        fs::write(dir.path().join("screener.log.2024-06-02"), "new").unwrap();
        fs::write(dir.path().join("keep.txt"), "data").unwrap();

        let removed = remove_log_files(dir.path(), "screener.log").unwrap();

        assert_eq!(removed, 2);
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_remove_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(remove_log_files(&missing, "screener.log").unwrap(), 0);
    }
}
