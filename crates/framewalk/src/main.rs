use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::error::ErrorKind;
use clap::Parser;
use framewalk_core::backend::create_backend;
use framewalk_core::settle::SettlePolicy;
use framewalk_core::tracer::{TraceOptions, TraceOutcome, Tracer};
use framewalk_core::types::{ThreadId, WalkEnd};
use framewalk_core::{FramewalkResult, MAX_FRAMES};
use framewalk_utils::{debug, error, format_from_env, init_logging, init_logging_with_level, LogGuard, LogLevel, LoggingError};

const DEFAULT_SETTLE: SettlePolicy = SettlePolicy::DEFAULT;

/// Print a symbolicated frame-pointer backtrace of a live thread.
#[derive(Parser, Debug)]
#[command(name = "framewalk")]
#[command(version)]
#[command(about = "Print a symbolicated frame-pointer backtrace of a live thread", long_about = None)]
struct Cli
{
    /// Thread id (TID) to walk
    thread: u64,

    /// Stop after this many frames
    #[arg(long, default_value_t = MAX_FRAMES, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_frames: usize,

    /// How many times to try reading the stopped thread's registers
    #[arg(long, default_value_t = DEFAULT_SETTLE.attempts)]
    settle_attempts: u32,

    /// Milliseconds between register read attempts
    #[arg(long, default_value_t = millis(DEFAULT_SETTLE.interval))]
    settle_interval_ms: u64,

    /// Give up on the register read after this many milliseconds
    #[arg(long, default_value_t = millis(DEFAULT_SETTLE.timeout))]
    settle_timeout_ms: u64,

    /// Print raw linkage names instead of demangled ones
    #[arg(long, default_value_t = false)]
    no_demangle: bool,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl Cli
{
    fn trace_options(&self) -> TraceOptions
    {
        TraceOptions {
            max_frames: self.max_frames,
            settle: SettlePolicy {
                attempts: self.settle_attempts,
                interval: Duration::from_millis(self.settle_interval_ms),
                timeout: Duration::from_millis(self.settle_timeout_ms),
            },
            demangle: !self.no_demangle,
        }
    }
}

const fn millis(duration: Duration) -> u64
{
    duration.as_millis() as u64
}

fn main() -> ExitCode
{
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = e.print();
            return code;
        }
    };

    let _log_guard = match setup_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    // `_log_guard` must drop before exit or FRAMEWALK_LOG_FILE loses buffered lines.
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(thread = cli.thread, error = %e, "trace failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(level: Option<LogLevel>) -> Result<LogGuard, LoggingError>
{
    match level {
        Some(level) => init_logging_with_level(level, format_from_env()?),
        None => init_logging(),
    }
}

fn run(cli: &Cli) -> FramewalkResult<()>
{
    let thread = ThreadId::from(cli.thread);
    let backend = create_backend()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = Tracer::new(cli.trace_options()).trace(backend, thread, &mut out)?;
    out.flush()?;

    match outcome {
        TraceOutcome::Walked(summary) => {
            debug!(%thread, frames = summary.frames, end = %summary.end, "trace complete");
            if let WalkEnd::Capped = summary.end {
                debug!(max_frames = cli.max_frames, "frame cap reached");
            }
        }
        TraceOutcome::NoInitialFrame(err) => {
            debug!(%thread, error = %err, "nothing walked");
        }
    }
    Ok(())
}
