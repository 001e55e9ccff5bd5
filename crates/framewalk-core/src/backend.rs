//! # Debug Backend Trait
//!
//! The seam between framewalk's logic and the OS debugging API.
//!
//! Everything above this trait (session lifecycle, settle polling, the frame
//! walk, symbol resolution) is platform independent and is tested against a
//! scripted backend. Each platform implements it with its own system calls:
//!
//! - **Linux**: `ptrace` plus `/proc` (see [`crate::platform::linux`])
//!
//! ## Lifecycle
//!
//! [`DebugSession`](crate::session::DebugSession) drives a backend through
//! `find_thread` → `install_debugger` → `open_channel` → `stop_thread` →
//! `create_context`, then any number of reads, then `delete_context` →
//! `remove_debugger` → `close_channel`. Backends don't have to guard against
//! calls out of that order.

use crate::error::FramewalkResult;
use crate::symbols::LoadedImage;
use crate::types::{Address, Architecture, FrameLink, MemoryRegion, ProcessId, StackFrame, ThreadId};

/// Operations a debug backend provides for one target thread
///
/// ## Thread Safety
///
/// Backends are driven from a single thread; no method needs to be `Sync`.
pub trait DebugBackend
{
    /// Architecture of the target; decides frame record layout and print width.
    fn architecture(&self) -> Architecture;

    /// Look up the process that owns `thread`.
    ///
    /// ## Errors
    ///
    /// - `ThreadNotFound`: no such thread
    fn find_thread(&mut self, thread: ThreadId) -> FramewalkResult<ProcessId>;

    /// Acquire debugging rights on the target.
    ///
    /// ## Errors
    ///
    /// - `PermissionDenied`: the OS refused
    /// - `ThreadNotFound`: the thread exited since `find_thread`
    /// - `AttachFailed`: anything else
    fn install_debugger(&mut self, process: ProcessId, thread: ThreadId) -> FramewalkResult<()>;

    /// Open the low-level channel used for memory and register queries.
    fn open_channel(&mut self, process: ProcessId) -> FramewalkResult<()>;

    /// Ask the target thread to stop. The stop may complete asynchronously;
    /// [`read_frame`](Self::read_frame) reports `ThreadNotStopped` until it has.
    fn stop_thread(&mut self, thread: ThreadId) -> FramewalkResult<()>;

    /// Create the debug context used by [`read_link`](Self::read_link).
    fn create_context(&mut self, process: ProcessId) -> FramewalkResult<()>;

    /// Read the innermost frame (instruction and frame pointer) of `thread`.
    ///
    /// ## Errors
    ///
    /// - `ThreadNotStopped`: the thread is not in a stoppable state yet
    /// - `ReadRegistersFailed`: the state could not be read
    fn read_frame(&mut self, thread: ThreadId) -> FramewalkResult<StackFrame>;

    /// Query the frame record `frame_pointer` points at.
    fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>;

    /// Mapped memory regions of the target.
    fn memory_regions(&mut self) -> FramewalkResult<Vec<MemoryRegion>>;

    /// Symbol tables of every code image loaded in the target.
    fn load_images(&mut self) -> FramewalkResult<Vec<LoadedImage>>;

    /// Release the debug context. Failures are logged, not returned.
    fn delete_context(&mut self);

    /// Give up debugging rights; resumes the target thread.
    fn remove_debugger(&mut self);

    /// Close the debug channel.
    fn close_channel(&mut self);
}

impl<B: DebugBackend + ?Sized> DebugBackend for Box<B>
{
    fn architecture(&self) -> Architecture
    {
        (**self).architecture()
    }

    fn find_thread(&mut self, thread: ThreadId) -> FramewalkResult<ProcessId>
    {
        (**self).find_thread(thread)
    }

    fn install_debugger(&mut self, process: ProcessId, thread: ThreadId) -> FramewalkResult<()>
    {
        (**self).install_debugger(process, thread)
    }

    fn open_channel(&mut self, process: ProcessId) -> FramewalkResult<()>
    {
        (**self).open_channel(process)
    }

    fn stop_thread(&mut self, thread: ThreadId) -> FramewalkResult<()>
    {
        (**self).stop_thread(thread)
    }

    fn create_context(&mut self, process: ProcessId) -> FramewalkResult<()>
    {
        (**self).create_context(process)
    }

    fn read_frame(&mut self, thread: ThreadId) -> FramewalkResult<StackFrame>
    {
        (**self).read_frame(thread)
    }

    fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>
    {
        (**self).read_link(frame_pointer)
    }

    fn memory_regions(&mut self) -> FramewalkResult<Vec<MemoryRegion>>
    {
        (**self).memory_regions()
    }

    fn load_images(&mut self) -> FramewalkResult<Vec<LoadedImage>>
    {
        (**self).load_images()
    }

    fn delete_context(&mut self)
    {
        (**self).delete_context();
    }

    fn remove_debugger(&mut self)
    {
        (**self).remove_debugger();
    }

    fn close_channel(&mut self)
    {
        (**self).close_channel();
    }
}

/// Create the debug backend for the current platform
///
/// ## Errors
///
/// - `Unsupported`: no backend for this OS or CPU architecture
pub fn create_backend() -> FramewalkResult<Box<dyn DebugBackend>>
{
    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        Ok(Box::new(crate::platform::linux::PtraceBackend::new()?))
    }

    #[cfg(not(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64"))))]
    {
        Err(crate::error::FramewalkError::Unsupported(format!(
            "no debug backend for {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )))
    }
}
