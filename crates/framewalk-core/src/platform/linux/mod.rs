//! # Linux Debugging Implementation
//!
//! [`DebugBackend`] on top of `ptrace(2)` and `/proc`.
//!
//! | Step | Mechanism |
//! |------|-----------|
//! | find thread | `Tgid:` line of `/proc/<tid>/status` |
//! | install debugger | `PTRACE_SEIZE` (the thread keeps running) |
//! | debug channel | `/proc/<pid>/mem`, read with `pread` |
//! | stop thread | `PTRACE_INTERRUPT` |
//! | debug context | snapshot of `/proc/<pid>/maps` |
//! | innermost frame | `waitpid(WNOHANG)` then `PTRACE_GETREGSET` |
//! | frame links | two-word frame record at the frame pointer |
//!
//! Only the target thread is seized; the rest of the process keeps running.
//!
//! ## References
//!
//! - [ptrace(2) man page](https://man7.org/linux/man-pages/man2/ptrace.2.html)
//! - [proc_pid_maps(5) man page](https://man7.org/linux/man-pages/man5/proc_pid_maps.5.html)

mod elf;
mod procfs;
mod ptrace;

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

use libc::pid_t;
use tracing::{debug, warn};

use self::procfs::MapEntry;
use self::ptrace::WaitState;
use crate::backend::DebugBackend;
use crate::error::{FramewalkError, FramewalkResult};
use crate::symbols::LoadedImage;
use crate::types::{Address, Architecture, FrameLink, MemoryRegion, ProcessId, StackFrame, ThreadId};

/// Frame record size: saved frame pointer followed by the return address.
const RECORD_WORDS: usize = 2;
const WORD: usize = 8;

/// ptrace-based debug backend
///
/// Holds the traced thread, the open `/proc/<pid>/mem` file and the maps
/// snapshot taken when the context was created.
#[derive(Debug)]
pub struct PtraceBackend
{
    architecture: Architecture,
    process: Option<ProcessId>,
    tid: Option<pid_t>,
    /// A ptrace-stop has been observed; `waitpid` must not be polled again.
    stopped: bool,
    mem: Option<File>,
    maps: Option<Vec<MapEntry>>,
}

impl PtraceBackend
{
    /// ## Errors
    ///
    /// - `Unsupported`: the CPU architecture has no frame record layout we know
    pub fn new() -> FramewalkResult<Self>
    {
        let architecture = Architecture::current();
        if let Architecture::Unknown(arch) = architecture {
            return Err(FramewalkError::Unsupported(format!("no frame record layout for {arch}")));
        }
        Ok(Self {
            architecture,
            process: None,
            tid: None,
            stopped: false,
            mem: None,
            maps: None,
        })
    }

    fn maps(&self) -> FramewalkResult<&[MapEntry]>
    {
        self.maps
            .as_deref()
            .ok_or_else(|| FramewalkError::ContextFailed("no debug context".to_string()))
    }
}

fn to_pid(thread: ThreadId) -> FramewalkResult<pid_t>
{
    pid_t::try_from(thread.raw()).map_err(|_| FramewalkError::InvalidArgument(format!("thread id {thread} out of range")))
}

fn attach_error(thread: ThreadId, err: io::Error) -> FramewalkError
{
    match err.raw_os_error() {
        Some(libc::EPERM) => FramewalkError::PermissionDenied(format!(
            "ptrace({thread}): {err}. Check kernel.yama.ptrace_scope or run with CAP_SYS_PTRACE"
        )),
        Some(libc::ESRCH) => FramewalkError::ThreadNotFound(thread),
        _ => FramewalkError::AttachFailed(format!("ptrace({thread}): {err}")),
    }
}

impl DebugBackend for PtraceBackend
{
    fn architecture(&self) -> Architecture
    {
        self.architecture
    }

    fn find_thread(&mut self, thread: ThreadId) -> FramewalkResult<ProcessId>
    {
        let process = procfs::owning_process(thread)?;
        debug!(%thread, %process, "found thread");
        Ok(process)
    }

    fn install_debugger(&mut self, process: ProcessId, thread: ThreadId) -> FramewalkResult<()>
    {
        let tid = to_pid(thread)?;
        ptrace::seize(tid).map_err(|err| attach_error(thread, err))?;
        self.process = Some(process);
        self.tid = Some(tid);
        self.stopped = false;
        Ok(())
    }

    fn open_channel(&mut self, process: ProcessId) -> FramewalkResult<()>
    {
        let path = format!("/proc/{process}/mem");
        let file = File::open(&path).map_err(|err| match err.raw_os_error() {
            Some(libc::EACCES | libc::EPERM) => FramewalkError::PermissionDenied(format!("{path}: {err}")),
            _ => FramewalkError::AttachFailed(format!("{path}: {err}")),
        })?;
        self.mem = Some(file);
        Ok(())
    }

    fn stop_thread(&mut self, thread: ThreadId) -> FramewalkResult<()>
    {
        let tid = to_pid(thread)?;
        ptrace::interrupt(tid).map_err(|err| attach_error(thread, err))
    }

    fn create_context(&mut self, process: ProcessId) -> FramewalkResult<()>
    {
        let maps = procfs::read_maps(process).map_err(|err| FramewalkError::ContextFailed(err.to_string()))?;
        debug!(%process, mappings = maps.len(), "captured memory map");
        self.maps = Some(maps);
        Ok(())
    }

    fn read_frame(&mut self, thread: ThreadId) -> FramewalkResult<StackFrame>
    {
        let tid = to_pid(thread)?;
        let registers_failed = |err: io::Error| FramewalkError::ReadRegistersFailed {
            thread,
            details: err.to_string(),
        };

        if !self.stopped {
            match ptrace::poll_state(tid).map_err(registers_failed)? {
                WaitState::Running => return Err(FramewalkError::ThreadNotStopped(thread)),
                WaitState::Gone => return Err(FramewalkError::ThreadNotFound(thread)),
                WaitState::Stopped => self.stopped = true,
            }
        }
        ptrace::read_frame(tid).map_err(registers_failed)
    }

    fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>
    {
        let len = RECORD_WORDS * WORD;
        let read_failed = |details: String| FramewalkError::ReadMemoryFailed {
            address: frame_pointer,
            len,
            details,
        };

        if frame_pointer.value() % WORD as u64 != 0 {
            return Err(read_failed("misaligned frame pointer".to_string()));
        }
        let mem = self
            .mem
            .as_ref()
            .ok_or_else(|| read_failed("debug channel is not open".to_string()))?;

        let mut record = [0u8; RECORD_WORDS * WORD];
        mem.read_exact_at(&mut record, frame_pointer.value())
            .map_err(|err| read_failed(err.to_string()))?;

        let (parent, ret) = record.split_at(WORD);
        let word = |bytes: &[u8]| {
            let mut buf = [0u8; WORD];
            buf.copy_from_slice(bytes);
            Address::from(u64::from_ne_bytes(buf))
        };
        Ok(FrameLink {
            parent_fp: word(parent),
            return_address: word(ret),
        })
    }

    fn memory_regions(&mut self) -> FramewalkResult<Vec<MemoryRegion>>
    {
        Ok(self.maps()?.iter().map(|entry| entry.region.clone()).collect())
    }

    fn load_images(&mut self) -> FramewalkResult<Vec<LoadedImage>>
    {
        let process = self
            .process
            .ok_or_else(|| FramewalkError::SymbolsUnavailable("not attached".to_string()))?;
        let maps = self
            .maps()
            .map_err(|err| FramewalkError::SymbolsUnavailable(err.to_string()))?;
        let images = elf::load_images(process, maps);
        if images.is_empty() {
            return Err(FramewalkError::SymbolsUnavailable(format!("no readable images in process {process}")));
        }
        Ok(images)
    }

    fn delete_context(&mut self)
    {
        self.maps = None;
    }

    fn remove_debugger(&mut self)
    {
        let Some(tid) = self.tid.take() else {
            return;
        };
        // PTRACE_DETACH needs the tracee in a ptrace-stop; consume a pending one.
        if !self.stopped {
            match ptrace::poll_state(tid) {
                Ok(WaitState::Stopped) => self.stopped = true,
                Ok(WaitState::Gone) => return,
                Ok(WaitState::Running) | Err(_) => {}
            }
        }
        if let Err(err) = ptrace::detach(tid) {
            // The kernel drops the trace relationship when we exit anyway.
            warn!(tid, error = %err, "PTRACE_DETACH failed");
        }
        self.stopped = false;
    }

    fn close_channel(&mut self)
    {
        self.mem = None;
        self.process = None;
    }
}
