use refunc_config::{Environment, EnvironmentError};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::io::Write;
use std::panic::PanicHookInfo;
use std::sync::{Once, OnceLock};
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, InitError},
};
use tracing_log::{LogTracer, log_tracer::SetLoggerError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber, Registry, fmt, layer::SubscriberExt};

/// JSON field name for the emulator environment in logs.
const ENVIRONMENT_KEY_IN_LOG: &str = "environment";

/// Directory, relative to the working directory, receiving production logs.
const LOG_DIR: &str = "logs";

/// Rotated files kept before the oldest is removed.
const MAX_LOG_FILES: usize = 5;

const DEFAULT_FILTER: &str = "info";

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to build rolling file appender: {0}")]
    InitAppender(#[from] InitError),

    #[error("failed to init log tracer: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("failed to determine the environment: {0}")]
    Environment(#[from] EnvironmentError),
}

/// Log flusher handle for ensuring logs are written before shutdown.
///
/// Must be held by `main` for the lifetime of the process.
#[must_use]
pub enum LogFlusher {
    /// Production flusher that ensures logs are written to files.
    Flusher(WorkerGuard),
    /// Development flusher that doesn't require explicit flushing.
    NullFlusher,
}

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes tracing for tests.
///
/// Set `ENABLE_TRACING=1` to view tracing output:
/// ```bash
/// ENABLE_TRACING=1 cargo test test_name
/// ```
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // Without an explicit env we'd default to prod and log to files.
            Environment::Dev.set();
            let _log_flusher =
                init_tracing("test").expect("Failed to initialize tracing for tests");
        }
    });
}

static ENVIRONMENT_NAME: OnceLock<String> = OnceLock::new();

/// Sets the emulator environment name injected into every JSON log entry.
pub fn set_global_environment_name(name: String) {
    let _ = ENVIRONMENT_NAME.set(name);
}

/// Returns the emulator environment name, if one was set.
pub fn get_global_environment_name() -> Option<&'static str> {
    ENVIRONMENT_NAME.get().map(|s| s.as_str())
}

/// Writer wrapper that injects the environment field into JSON log entries.
struct EnvironmentInjectingWriter<W> {
    inner: W,
}

impl<W> EnvironmentInjectingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W> Write for EnvironmentInjectingWriter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(output) = inject_environment(buf) {
            // Report the original length, the caller only knows about `buf`.
            return self.inner.write_all(output.as_bytes()).map(|()| buf.len());
        }

        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Returns the rewritten log line, or `None` when `buf` should be written unchanged.
fn inject_environment(buf: &[u8]) -> Option<String> {
    let environment = get_global_environment_name()?;
    let json_str = std::str::from_utf8(buf).ok()?;

    let serde_json::Value::Object(mut map) = serde_json::from_str(json_str).ok()? else {
        return None;
    };
    if map.contains_key(ENVIRONMENT_KEY_IN_LOG) {
        return None;
    }

    map.insert(
        ENVIRONMENT_KEY_IN_LOG.to_owned(),
        serde_json::Value::String(environment.to_owned()),
    );
    let modified = serde_json::to_string(&map).ok()?;

    if json_str.ends_with('\n') {
        Some(format!("{modified}\n"))
    } else {
        Some(modified)
    }
}

/// Initializes tracing for the application.
///
/// Production and staging write JSON lines to daily rotated files under
/// [`LOG_DIR`], development writes pretty records to stdout. The filter is
/// taken from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    init_tracing_with_environment_name(app_name, None)
}

/// Like [`init_tracing`], additionally tagging every JSON log entry with `environment_name`.
pub fn init_tracing_with_environment_name(
    app_name: &str,
    environment_name: Option<String>,
) -> Result<LogFlusher, TracingError> {
    if let Some(name) = environment_name {
        set_global_environment_name(name);
    }

    // Forwards records of dependencies still logging through `log`.
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let log_flusher = match Environment::load()? {
        environment if environment.is_prod() => init_file_logging(filter, app_name)?,
        _ => init_console_logging(filter)?,
    };

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous_hook(info);
    }));

    Ok(log_flusher)
}

fn init_file_logging(filter: EnvFilter, app_name: &str) -> Result<LogFlusher, TracingError> {
    let appender = rolling::Builder::new()
        .filename_prefix(app_name)
        .filename_suffix("log")
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .build(LOG_DIR)?;
    let (appender, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(move || EnvironmentInjectingWriter::new(appender.make_writer()))
        .json()
        .with_current_span(true)
        .with_span_list(true);
    set_global_default(Registry::default().with(filter).with(layer))?;

    Ok(LogFlusher::Flusher(guard))
}

fn init_console_logging(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_file(false)
        .with_line_number(false)
        .pretty()
        .finish();
    set_global_default(subscriber)?;

    Ok(LogFlusher::NullFlusher)
}

fn log_panic(info: &PanicHookInfo) {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    let location = info.location().map(|location| location.to_string());

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        tracing::error!(
            panic.payload = payload,
            panic.location = location,
            panic.backtrace = %backtrace,
            "a panic occurred",
        );
    } else {
        tracing::error!(
            panic.payload = payload,
            panic.location = location,
            "a panic occurred, run with RUST_BACKTRACE=1 to capture a backtrace",
        );
    }
}
