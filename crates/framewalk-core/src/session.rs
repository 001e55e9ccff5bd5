//! # Debug Session
//!
//! Scoped ownership of a debugged thread.
//!
//! Constructing a [`DebugSession`] attaches; dropping it detaches. Every
//! resource acquired during attach (debugger rights, debug channel, debug
//! context) is released exactly once, whether the session ends normally,
//! through an early `?`, or because attach itself failed half way.
//!
//! ## Example
//!
//! ```rust,no_run
//! use framewalk_core::backend::create_backend;
//! use framewalk_core::session::DebugSession;
//! use framewalk_core::types::ThreadId;
//!
//! let backend = create_backend()?;
//! let mut session = DebugSession::attach(backend, ThreadId::from(4242))?;
//! let frame = session.read_frame()?;
//! println!("ip = {}", frame.ip);
//! // Debugger removed and channel closed here
//! drop(session);
//! # Ok::<(), framewalk_core::error::FramewalkError>(())
//! ```

use tracing::{debug, info};

use crate::backend::DebugBackend;
use crate::error::FramewalkResult;
use crate::symbols::LoadedImage;
use crate::types::{Address, Architecture, FrameLink, MemoryRegion, ProcessId, StackFrame, ThreadId};
use crate::walker::FrameSource;

/// Which attach steps have completed and still need undoing.
#[derive(Debug, Default, Clone, Copy)]
struct Held
{
    debugger: bool,
    channel: bool,
    context: bool,
}

/// An attached, stopped target thread
pub struct DebugSession<B: DebugBackend>
{
    backend: B,
    process: ProcessId,
    thread: ThreadId,
    held: Held,
}

impl<B: DebugBackend> DebugSession<B>
{
    /// Attach to `thread`: look up its process, install the debugger, open the
    /// debug channel, request the thread stop, and create the debug context.
    ///
    /// ## Errors
    ///
    /// Whatever the first failing backend step returns. Steps that already
    /// succeeded are released before the error is returned.
    pub fn attach(mut backend: B, thread: ThreadId) -> FramewalkResult<Self>
    {
        let process = backend.find_thread(thread)?;
        info!(%process, %thread, "attaching");

        let mut session = Self {
            backend,
            process,
            thread,
            held: Held::default(),
        };

        session.backend.install_debugger(process, thread)?;
        session.held.debugger = true;

        session.backend.open_channel(process)?;
        session.held.channel = true;

        session.backend.stop_thread(thread)?;

        session.backend.create_context(process)?;
        session.held.context = true;

        debug!(%process, %thread, "attached");
        Ok(session)
    }

    /// Process that owns the target thread.
    pub fn process(&self) -> ProcessId
    {
        self.process
    }

    /// The target thread.
    pub fn thread(&self) -> ThreadId
    {
        self.thread
    }

    pub fn architecture(&self) -> Architecture
    {
        self.backend.architecture()
    }

    /// Read the innermost frame of the target thread.
    ///
    /// ## Errors
    ///
    /// `ThreadNotStopped` while the thread is still settling; see
    /// [`SettlePolicy`](crate::settle::SettlePolicy).
    pub fn read_frame(&mut self) -> FramewalkResult<StackFrame>
    {
        self.backend.read_frame(self.thread)
    }

    /// Mapped memory regions of the target process.
    pub fn memory_regions(&mut self) -> FramewalkResult<Vec<MemoryRegion>>
    {
        self.backend.memory_regions()
    }

    /// Symbol tables of the images loaded in the target process.
    pub fn load_images(&mut self) -> FramewalkResult<Vec<LoadedImage>>
    {
        self.backend.load_images()
    }

    /// Detach now instead of at drop.
    pub fn detach(mut self)
    {
        self.release();
    }

    fn release(&mut self)
    {
        let Held {
            debugger,
            channel,
            context,
        } = self.held;
        if !(debugger || channel || context) {
            return;
        }

        if self.held.context {
            self.held.context = false;
            self.backend.delete_context();
        }
        if self.held.debugger {
            self.held.debugger = false;
            self.backend.remove_debugger();
        }
        if self.held.channel {
            self.held.channel = false;
            self.backend.close_channel();
        }
        debug!(process = %self.process, thread = %self.thread, "session released");
    }
}

impl<B: DebugBackend> FrameSource for DebugSession<B>
{
    fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>
    {
        self.backend.read_link(frame_pointer)
    }
}

impl<B: DebugBackend> Drop for DebugSession<B>
{
    fn drop(&mut self)
    {
        self.release();
    }
}
