//! Frame line formatting.
//!
//! One line per frame: the frame pointer, zero padded to the target's pointer
//! width, then the resolution (if any) after two spaces.
//!
//! ```text
//! 0x00007ffc8a2b1e90  app: app::worker::run + 0x4c
//! 0x00007ffc8a2b1ef0  libc.so.6: start_thread + 0x9ca (closest symbol)
//! 0x00007ffc8a2b1f50  [vdso] + 0x8f0
//! 0x00007ffc8a2b1fb0
//! ```

use std::io::{self, Write};

use crate::types::{Architecture, StackFrame, SymbolMatch};

/// Formats frame lines for one target architecture.
#[derive(Debug, Clone, Copy)]
pub struct FrameFormatter
{
    width: usize,
}

impl FrameFormatter
{
    pub fn new(architecture: Architecture) -> Self
    {
        Self {
            width: architecture.pointer_hex_width(),
        }
    }

    /// Hex digits printed for a frame pointer.
    pub fn width(&self) -> usize
    {
        self.width
    }

    /// Render one frame line without the trailing newline.
    pub fn format(&self, frame: &StackFrame, resolution: &SymbolMatch) -> String
    {
        let pointer = format!("0x{:0width$x}", frame.fp, width = self.width);
        if resolution.is_resolved() {
            format!("{pointer}  {resolution}")
        } else {
            pointer
        }
    }

    /// Write one frame line followed by a newline.
    ///
    /// ## Errors
    ///
    /// Whatever `out` returns.
    pub fn write_frame<W: Write + ?Sized>(&self, out: &mut W, frame: &StackFrame, resolution: &SymbolMatch) -> io::Result<()>
    {
        writeln!(out, "{}", self.format(frame, resolution))
    }
}
