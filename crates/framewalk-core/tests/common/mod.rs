//! Scripted debug backend shared by the integration tests.
//!
//! Every call is appended to a shared log so a test can still inspect it after
//! the backend has been moved into a session or tracer.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use framewalk_core::backend::DebugBackend;
use framewalk_core::error::{FramewalkError, FramewalkResult};
use framewalk_core::symbols::LoadedImage;
use framewalk_core::types::{Address, Architecture, FrameLink, MemoryRegion, ProcessId, StackFrame, ThreadId};

pub const THREAD: ThreadId = ThreadId(4242);
pub const PROCESS: ProcessId = ProcessId(4200);

/// Frame pointer of the innermost frame; the chain grows upwards from here.
pub const STACK_BASE: u64 = 0x7ffc_0000_1000;
const FRAME_SIZE: u64 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call
{
    FindThread,
    InstallDebugger,
    OpenChannel,
    StopThread,
    CreateContext,
    ReadFrame,
    ReadLink(Address),
    MemoryRegions,
    LoadImages,
    DeleteContext,
    RemoveDebugger,
    CloseChannel,
}

/// Attach steps that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step
{
    FindThread,
    InstallDebugger,
    OpenChannel,
    StopThread,
    CreateContext,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct MockBackend
{
    log: CallLog,
    start: StackFrame,
    links: HashMap<Address, FrameLink>,
    fail_step: Option<Step>,
    /// `read_frame` reports `ThreadNotStopped` this many times first.
    unsettled_reads: Option<u32>,
    images: Option<Vec<LoadedImage>>,
    regions: Vec<MemoryRegion>,
}

impl MockBackend
{
    /// Backend whose thread has a single frame with a null parent.
    pub fn new() -> Self
    {
        Self {
            log: CallLog::default(),
            start: StackFrame::new(Address::from(0x5555_0000_0000), Address::from(STACK_BASE)),
            links: HashMap::new(),
            fail_step: None,
            unsettled_reads: Some(0),
            images: Some(Vec::new()),
            regions: Vec::new(),
        }
    }

    /// Null-terminated chain of `len` frames; frame `i` executes at `ip(i)`.
    pub fn with_chain(mut self, len: usize, ip: impl Fn(usize) -> u64) -> Self
    {
        assert!(len > 0);
        self.links.clear();
        self.start = StackFrame::new(Address::from(ip(0)), frame_pointer(0));
        for i in 0..len {
            let parent_fp = if i + 1 == len { Address::ZERO } else { frame_pointer(i + 1) };
            let return_address = if i + 1 == len { Address::ZERO } else { Address::from(ip(i + 1)) };
            self.links.insert(
                frame_pointer(i),
                FrameLink {
                    return_address,
                    parent_fp,
                },
            );
        }
        self
    }

    /// Chain whose last frame points back at the first one.
    pub fn with_cycle(mut self, len: usize) -> Self
    {
        self = self.with_chain(len, |i| 0x5555_0000_0000 + i as u64);
        let last = frame_pointer(len - 1);
        self.links.insert(
            last,
            FrameLink {
                return_address: Address::from(0x5555_0000_0000),
                parent_fp: frame_pointer(0),
            },
        );
        self
    }

    /// Drop the frame record of frame `index`, so querying it fails.
    pub fn breaking_at(mut self, index: usize) -> Self
    {
        self.links.remove(&frame_pointer(index));
        self
    }

    pub fn failing_at(mut self, step: Step) -> Self
    {
        self.fail_step = Some(step);
        self
    }

    /// `read_frame` succeeds after `reads` `ThreadNotStopped` answers.
    pub fn settling_after(mut self, reads: u32) -> Self
    {
        self.unsettled_reads = Some(reads);
        self
    }

    /// `read_frame` never succeeds.
    pub fn never_stopping(mut self) -> Self
    {
        self.unsettled_reads = None;
        self
    }

    pub fn with_images(mut self, images: Vec<LoadedImage>) -> Self
    {
        self.images = Some(images);
        self
    }

    /// `load_images` fails with `SymbolsUnavailable`.
    pub fn without_symbols(mut self) -> Self
    {
        self.images = None;
        self
    }

    pub fn with_regions(mut self, regions: Vec<MemoryRegion>) -> Self
    {
        self.regions = regions;
        self
    }

    pub fn log(&self) -> CallLog
    {
        Rc::clone(&self.log)
    }

    fn record(&self, call: Call)
    {
        self.log.borrow_mut().push(call);
    }

    fn step(&self, step: Step, call: Call) -> FramewalkResult<()>
    {
        self.record(call);
        if self.fail_step == Some(step) {
            return Err(match step {
                Step::FindThread => FramewalkError::ThreadNotFound(THREAD),
                Step::InstallDebugger => FramewalkError::PermissionDenied("scripted".into()),
                Step::OpenChannel | Step::StopThread => FramewalkError::AttachFailed("scripted".into()),
                Step::CreateContext => FramewalkError::ContextFailed("scripted".into()),
            });
        }
        Ok(())
    }
}

pub fn frame_pointer(index: usize) -> Address
{
    Address::from(STACK_BASE + index as u64 * FRAME_SIZE)
}

/// How many times `call` appears in `log`.
pub fn count(log: &CallLog, call: Call) -> usize
{
    log.borrow().iter().filter(|&&c| c == call).count()
}

/// Position of the first `call` in `log`.
pub fn position(log: &CallLog, call: Call) -> Option<usize>
{
    log.borrow().iter().position(|&c| c == call)
}

/// Cleanup calls in the order they happened.
pub fn cleanup_calls(log: &CallLog) -> Vec<Call>
{
    log.borrow()
        .iter()
        .copied()
        .filter(|c| matches!(c, Call::DeleteContext | Call::RemoveDebugger | Call::CloseChannel))
        .collect()
}

impl DebugBackend for MockBackend
{
    fn architecture(&self) -> Architecture
    {
        Architecture::X86_64
    }

    fn find_thread(&mut self, thread: ThreadId) -> FramewalkResult<ProcessId>
    {
        assert_eq!(thread, THREAD);
        self.step(Step::FindThread, Call::FindThread)?;
        Ok(PROCESS)
    }

    fn install_debugger(&mut self, process: ProcessId, _thread: ThreadId) -> FramewalkResult<()>
    {
        assert_eq!(process, PROCESS);
        self.step(Step::InstallDebugger, Call::InstallDebugger)
    }

    fn open_channel(&mut self, _process: ProcessId) -> FramewalkResult<()>
    {
        self.step(Step::OpenChannel, Call::OpenChannel)
    }

    fn stop_thread(&mut self, _thread: ThreadId) -> FramewalkResult<()>
    {
        self.step(Step::StopThread, Call::StopThread)
    }

    fn create_context(&mut self, _process: ProcessId) -> FramewalkResult<()>
    {
        self.step(Step::CreateContext, Call::CreateContext)
    }

    fn read_frame(&mut self, thread: ThreadId) -> FramewalkResult<StackFrame>
    {
        self.record(Call::ReadFrame);
        match &mut self.unsettled_reads {
            Some(0) => Ok(self.start),
            Some(remaining) => {
                *remaining -= 1;
                Err(FramewalkError::ThreadNotStopped(thread))
            }
            None => Err(FramewalkError::ThreadNotStopped(thread)),
        }
    }

    fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>
    {
        self.record(Call::ReadLink(frame_pointer));
        self.links
            .get(&frame_pointer)
            .copied()
            .ok_or_else(|| FramewalkError::ReadMemoryFailed {
                address: frame_pointer,
                len: 16,
                details: "no frame record".into(),
            })
    }

    fn memory_regions(&mut self) -> FramewalkResult<Vec<MemoryRegion>>
    {
        self.record(Call::MemoryRegions);
        Ok(self.regions.clone())
    }

    fn load_images(&mut self) -> FramewalkResult<Vec<LoadedImage>>
    {
        self.record(Call::LoadImages);
        self.images
            .clone()
            .ok_or_else(|| FramewalkError::SymbolsUnavailable("scripted".into()))
    }

    fn delete_context(&mut self)
    {
        self.record(Call::DeleteContext);
    }

    fn remove_debugger(&mut self)
    {
        self.record(Call::RemoveDebugger);
    }

    fn close_channel(&mut self)
    {
        self.record(Call::CloseChannel);
    }
}
