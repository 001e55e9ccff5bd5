//! # Tracer
//!
//! One complete run: attach, build the symbol lookup context, wait for the
//! thread to settle, walk and print, then release everything.
//!
//! ## Failure tiers
//!
//! - Attach errors are returned; nothing was printed and nothing stays attached.
//! - A missing symbol context only degrades output to regions and raw pointers.
//! - If the innermost frame can't be read the walk is skipped and the run
//!   still ends normally with [`TraceOutcome::NoInitialFrame`].
//! - A failed frame query ends the walk early; frames already printed stay.
//! - A failed write to the output ends the walk and is returned after cleanup.
//!
//! ## Example
//!
//! ```rust,no_run
//! use framewalk_core::backend::create_backend;
//! use framewalk_core::tracer::{TraceOptions, Tracer};
//! use framewalk_core::types::ThreadId;
//!
//! let backend = create_backend()?;
//! let outcome = Tracer::new(TraceOptions::default()).trace(backend, ThreadId::from(4242), &mut std::io::stdout())?;
//! println!("{outcome:?}");
//! # Ok::<(), framewalk_core::error::FramewalkError>(())
//! ```

use std::io::Write;
use std::ops::ControlFlow;

use tracing::{info, warn};

use crate::backend::DebugBackend;
use crate::error::{FramewalkError, FramewalkResult};
use crate::report::FrameFormatter;
use crate::session::DebugSession;
use crate::settle::SettlePolicy;
use crate::symbols::{Demangle, NativeDemangler, NoDemangle, Resolver, SymbolIndex};
use crate::types::{ThreadId, WalkEnd};
use crate::walker::{FrameWalker, MAX_FRAMES};

/// Knobs for a trace run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceOptions
{
    /// Frame cap for the walk.
    pub max_frames: usize,
    /// Polling used for the innermost frame read.
    pub settle: SettlePolicy,
    /// Demangle Rust and C++ symbol names.
    pub demangle: bool,
}

impl Default for TraceOptions
{
    fn default() -> Self
    {
        Self {
            max_frames: MAX_FRAMES,
            settle: SettlePolicy::default(),
            demangle: true,
        }
    }
}

/// What a completed walk produced.
#[derive(Debug)]
pub struct TraceSummary
{
    /// Frame lines printed.
    pub frames: usize,
    pub end: WalkEnd,
}

/// How a run ended, short of a fatal setup error.
#[derive(Debug)]
pub enum TraceOutcome
{
    /// The walk ran; see the summary for how it stopped.
    Walked(TraceSummary),
    /// The innermost frame could not be read, so nothing was walked.
    NoInitialFrame(FramewalkError),
}

/// Drives one trace run
pub struct Tracer
{
    options: TraceOptions,
    demangler: Box<dyn Demangle>,
}

impl Tracer
{
    /// Tracer using the demangler selected by `options.demangle`.
    pub fn new(options: TraceOptions) -> Self
    {
        let demangler: Box<dyn Demangle> = if options.demangle {
            Box::new(NativeDemangler)
        } else {
            Box::new(NoDemangle)
        };
        Self { options, demangler }
    }

    /// Replace the demangler, e.g. with one for a different toolchain.
    #[must_use]
    pub fn with_demangler(mut self, demangler: impl Demangle + 'static) -> Self
    {
        self.demangler = Box::new(demangler);
        self
    }

    pub fn options(&self) -> &TraceOptions
    {
        &self.options
    }

    /// Attach to `thread` through `backend` and print its frames to `out`.
    ///
    /// ## Errors
    ///
    /// - any attach error (`ThreadNotFound`, `PermissionDenied`, `AttachFailed`, `ContextFailed`)
    /// - `Io` if writing to `out` fails
    pub fn trace<B, W>(self, backend: B, thread: ThreadId, out: &mut W) -> FramewalkResult<TraceOutcome>
    where
        B: DebugBackend,
        W: Write + ?Sized,
    {
        let Tracer { options, demangler } = self;
        let mut session = DebugSession::attach(backend, thread)?;
        let resolver = build_resolver(&mut session, demangler);

        let start = match options.settle.poll(|| session.read_frame()) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%thread, error = %err, "could not read initial frame; skipping walk");
                return Ok(TraceOutcome::NoInitialFrame(err));
            }
        };
        info!(%thread, ip = %start.ip, fp = %start.fp, "walking");

        let formatter = FrameFormatter::new(session.architecture());
        let mut write_error = None;
        let walk = FrameWalker::new(options.max_frames).walk_with(&mut session, start, |_, frame| {
            let resolution = resolver.resolve(frame.ip);
            match formatter.write_frame(out, frame, &resolution) {
                Ok(()) => ControlFlow::Continue(()),
                Err(err) => {
                    write_error = Some(err);
                    ControlFlow::Break(())
                }
            }
        });

        drop(resolver);
        session.detach();

        if let Some(err) = write_error {
            return Err(err.into());
        }
        out.flush()?;

        if let WalkEnd::LinkFailed(err) = &walk.end {
            warn!(%thread, error = %err, frames = walk.frames.len(), "frame chain ended early");
        }
        Ok(TraceOutcome::Walked(TraceSummary {
            frames: walk.frames.len(),
            end: walk.end,
        }))
    }
}

fn build_resolver<B: DebugBackend>(session: &mut DebugSession<B>, demangler: Box<dyn Demangle>) -> Resolver
{
    let index = match session.load_images() {
        Ok(images) => Some(SymbolIndex::build(images, demangler)),
        Err(err) => {
            warn!(error = %err, "symbol lookup unavailable; falling back to memory regions");
            None
        }
    };
    let regions = session.memory_regions().unwrap_or_else(|err| {
        warn!(error = %err, "memory regions unavailable");
        Vec::new()
    });
    Resolver::new(index, regions)
}
