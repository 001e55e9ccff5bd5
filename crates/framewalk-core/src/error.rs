//! # Error Types
//!
//! Errors raised while attaching to and walking a target thread.
//!
//! We use `thiserror` to generate the `Error` implementations and messages.
//!
//! ## Tiers
//!
//! Setup errors (`ThreadNotFound`, `PermissionDenied`, `AttachFailed`,
//! `ContextFailed`, `Unsupported`) are fatal for a run. Everything raised
//! while resolving or walking individual frames is recovered by the caller and
//! only degrades the output.

use thiserror::Error;

use crate::types::{Address, ThreadId};

/// Main error type for framewalk operations
#[derive(Error, Debug)]
pub enum FramewalkError
{
    /// The thread with the given id doesn't exist or has exited
    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),

    /// Insufficient permissions to debug the target process
    ///
    /// On Linux this is `EPERM` from `ptrace`, typically because of
    /// `kernel.yama.ptrace_scope` or a missing `CAP_SYS_PTRACE`.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid argument passed to a framewalk function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Installing the debugger or opening the debug channel failed
    #[error("Failed to attach: {0}")]
    AttachFailed(String),

    /// The debug context used for frame queries could not be created
    #[error("Failed to create debug context: {0}")]
    ContextFailed(String),

    /// The thread has not reached a stoppable state yet
    ///
    /// Raised while the target is still settling after the stop request;
    /// the settle policy retries only this error.
    #[error("Thread {0} is not stopped")]
    ThreadNotStopped(ThreadId),

    /// Failed to read the thread's registers
    #[error("Failed to read registers of thread {thread}: {details}")]
    ReadRegistersFailed
    {
        /// Thread whose state was requested
        thread: ThreadId,
        /// OS error or other details
        details: String,
    },

    /// Reading target memory failed (e.g. a frame record at a bad frame pointer)
    #[error("Failed to read {len} bytes at {address}: {details}")]
    ReadMemoryFailed
    {
        address: Address,
        len: usize,
        details: String,
    },

    /// The symbol lookup context could not be built
    #[error("Symbols unavailable: {0}")]
    SymbolsUnavailable(String),

    /// No debug backend exists for this platform or target architecture
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// I/O error (procfs reads, image files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, FramewalkError>`
///
/// ```rust
/// use framewalk_core::error::FramewalkResult;
/// fn foo() -> FramewalkResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type FramewalkResult<T> = std::result::Result<T, FramewalkError>;
