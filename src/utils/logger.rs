use crate::utils::error::Result;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "dtgen_";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dtgen=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dtgen=info"))
    }
}

/// Console logging (stderr, so `--json` output stays clean) plus a per-run
/// log file under `log_dir`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the program. When the log directory cannot be created the
/// console layer is still installed and `None` is returned.
pub fn init_cli_logger(verbose: bool, log_dir: &Path) -> Option<WorkerGuard> {
    let file_name = format!(
        "{}{}",
        LOG_FILE_PREFIX,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );

    let appender = std::fs::create_dir_all(log_dir).ok().and_then(|_| {
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .filename_suffix("log")
            .build(log_dir)
            .ok()
    });

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(default_filter(verbose));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_filter(default_filter(verbose)),
        )
        .with(file_layer)
        .init();

    if guard.is_none() {
        tracing::warn!("Could not open log directory {}, logging to console only", log_dir.display());
    }

    guard
}

/// Removes `dtgen_*.log` files in `log_dir` last modified more than `days` ago.
/// Returns how many files were deleted.
pub fn clean_old_logs(log_dir: &Path, days: u64) -> Result<usize> {
    if !log_dir.is_dir() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY));
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(LOG_FILE_PREFIX) || !name.ends_with(".log") {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            std::fs::remove_file(entry.path())?;
            tracing::info!("Removed old log file: {}", entry.path().display());
            removed += 1;
        }
    }

    Ok(removed)
}
