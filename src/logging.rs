use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static FILE_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Environment variable that turns on debug logging and the log file.
pub const DEBUG_ENV: &str = "HOTCLICK_DEBUG";

/// Initialise logging. With `debug` the level is `debug` and `RUST_LOG` may
/// override it; otherwise it is forced to `info`. When `file` is given the
/// output is mirrored into it. Calling this twice is a no-op.
pub fn init(debug: bool, file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_layer = file.and_then(|path| {
        let name = path.file_name()?.to_owned();
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        // Dropping the guard stops the writer thread.
        let mut slot = FILE_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(guard);
        }
        Some(fmt::layer().with_writer(writer).with_ansi(false))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
}

/// Write out everything still queued for the log file and close it. Call
/// once, right before the process exits.
pub fn flush() {
    let guard = FILE_GUARD.lock().unwrap_or_else(PoisonError::into_inner).take();
    drop(guard);
}

/// `true` when [`DEBUG_ENV`] is set to anything but `0` or an empty value.
pub fn debug_requested() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|value| !value.is_empty() && value != "0")
}
