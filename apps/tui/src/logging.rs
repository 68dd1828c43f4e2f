//! File-only tracing setup. The terminal belongs to the UI, so nothing is
//! ever written to stdout or stderr once the subscriber is installed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "agrivision.log";

/// Keeps the background writer alive. Dropping it flushes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default filter directive when `RUST_LOG` is not set.
pub const fn default_directive(debug: bool) -> &'static str {
    if debug {
        "agrivision=debug,info"
    } else {
        "info"
    }
}

/// Truncates `<log_dir>/agrivision.log` and routes all `tracing` output to it.
pub fn init_logging(log_dir: &Path, debug: bool) -> Result<LoggingGuard, io::Error> {
    let path = prepare_log_file(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| io::Error::other(err.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}

fn prepare_log_file(log_dir: &Path) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    fs::write(&path, "")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("agrivision_{name}_{nanos}"))
    }

    #[test]
    fn debug_flag_raises_crate_level() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).starts_with("agrivision=debug"));
    }

    #[test]
    fn prepare_creates_directory_and_empty_file() {
        let dir = scratch_dir("create");
        assert!(!dir.exists());

        let path = prepare_log_file(&dir).unwrap();
        assert_eq!(path, dir.join(LOG_FILE));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn prepare_truncates_previous_session() {
        let dir = scratch_dir("truncate");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LOG_FILE), "previous run").unwrap();

        let path = prepare_log_file(&dir).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "");

        fs::remove_dir_all(&dir).unwrap();
    }
}
