//! # Logging Utilities
//!
//! Logging for framewalk using `tracing`.
//!
//! framewalk prints its trace on stdout, so console logs always go to
//! **stderr**. Defaults are quiet: only warnings and errors are shown unless
//! asked for.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use framewalk_utils::init_logging;
//!
//! // Keep the guard alive until exit so buffered file logs are flushed
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::warn!("shown by default");
//! tracing::debug!("shown with RUST_LOG=debug");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=framewalk_core=trace`)
//! - `FRAMEWALK_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `FRAMEWALK_LOG_FILE`: Optional path to a log file, written in addition to stderr
//!
//! ## Examples
//!
//! ```rust,no_run
//! use framewalk_utils::{init_logging_with_level, LogFormat, LogLevel};
//!
//! // An explicit level (e.g. from --log-level) wins over RUST_LOG
//! let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Json).expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::io::IsTerminal;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "FRAMEWALK_LOG_FORMAT";
/// Environment variable naming an extra log file.
pub const FILE_ENV: &str = "FRAMEWALK_LOG_FILE";

/// Level used when neither an explicit level nor `RUST_LOG` is given.
pub const DEFAULT_LEVEL: LogLevel = LogLevel::Warn;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    /// Warning level (default)
    Warn,
    Info,
    Debug,
    /// Trace level; logs every frame record read
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the file writer's background thread alive
///
/// Dropping it flushes whatever is still buffered for `FRAMEWALK_LOG_FILE`.
#[derive(Debug)]
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// Reads `RUST_LOG` (default `warn`), `FRAMEWALK_LOG_FORMAT` and
/// `FRAMEWALK_LOG_FILE`.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `RUST_LOG` or `FRAMEWALK_LOG_FORMAT` can't be parsed
/// - The log file directory can't be created
pub fn init_logging() -> Result<LogGuard, LoggingError>
{
    let filter = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives).map_err(|err| LoggingError::InvalidLevel(err.to_string()))?,
        Err(_) => level_filter(DEFAULT_LEVEL),
    };
    init(filter, format_from_env()?, file_from_env())
}

/// Initialize logging with an explicit level and format
///
/// `RUST_LOG` and `FRAMEWALK_LOG_FORMAT` are ignored; `FRAMEWALK_LOG_FILE` is
/// still honored.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LogGuard, LoggingError>
{
    init(level_filter(level), format, file_from_env())
}

/// Format selected by `FRAMEWALK_LOG_FORMAT`, or [`LogFormat::Pretty`] when unset.
///
/// ## Errors
///
/// `InvalidFormat` if the variable is set to something unknown.
pub fn format_from_env() -> Result<LogFormat, LoggingError>
{
    match env::var(FORMAT_ENV) {
        Ok(value) => value.parse().map_err(LoggingError::InvalidFormat),
        Err(_) => Ok(LogFormat::default()),
    }
}

fn file_from_env() -> Option<PathBuf>
{
    env::var_os(FILE_ENV).filter(|value| !value.is_empty()).map(PathBuf::from)
}

fn level_filter(level: LogLevel) -> EnvFilter
{
    EnvFilter::new(Level::from(level).to_string())
}

fn init(filter: EnvFilter, format: LogFormat, log_file: Option<PathBuf>) -> Result<LogGuard, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![console_layer(format)];
    let mut guard = None;

    if let Some(path) = log_file {
        let (layer, worker) = file_layer(format, &path)?;
        layers.push(layer);
        guard = Some(worker);
    }

    Registry::default()
        .with(layers.with_filter(filter))
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LogGuard { _file: guard })
}

fn console_layer(format: LogFormat) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        // No colors when stderr is redirected
        LogFormat::Pretty => layer.with_ansi(io::stderr().is_terminal()).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

fn file_layer(format: LogFormat, path: &Path) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidFile(path.display().to_string()))?;
    std::fs::create_dir_all(&directory)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false); // No ANSI in files

    let layer = match format {
        LogFormat::Pretty => layer.boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    };
    Ok((layer, guard))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level or `RUST_LOG` directive
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// `FRAMEWALK_LOG_FILE` doesn't name a file
    #[error("Invalid log file: {0}")]
    InvalidFile(String),

    /// A global subscriber is already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
