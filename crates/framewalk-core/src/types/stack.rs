//! Stack frame types.

use std::fmt;

use super::Address;

/// One frame of the target's call stack.
///
/// The instruction pointer is what gets symbolicated; the frame pointer is
/// what gets printed and what the next debug-context query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame
{
    /// Instruction pointer (current pc for the innermost frame, return address otherwise).
    pub ip: Address,
    /// Frame pointer of this frame.
    pub fp: Address,
}

impl StackFrame
{
    pub const fn new(ip: Address, fp: Address) -> Self
    {
        Self { ip, fp }
    }
}

/// Result of querying the frame record a frame pointer points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLink
{
    /// Return address saved in the frame record; the caller's instruction pointer.
    pub return_address: Address,
    /// Saved frame pointer of the caller. Null ends the chain.
    pub parent_fp: Address,
}

impl FrameLink
{
    /// The frame this link leads to.
    pub const fn parent(self) -> StackFrame
    {
        StackFrame::new(self.return_address, self.parent_fp)
    }
}

/// How a frame walk came to an end.
#[derive(Debug)]
pub enum WalkEnd
{
    /// The chain ended with a null parent frame pointer.
    Terminated,
    /// The frame cap was reached before the chain ended.
    Capped,
    /// Querying the next frame record failed; earlier frames are kept.
    LinkFailed(crate::error::FramewalkError),
    /// The visitor asked to stop, e.g. because its output went away.
    Stopped,
}

impl WalkEnd
{
    /// Returns `true` when the walk hit the frame cap.
    pub const fn is_capped(&self) -> bool
    {
        matches!(self, WalkEnd::Capped)
    }
}

impl fmt::Display for WalkEnd
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            WalkEnd::Terminated => write!(f, "end of frame chain"),
            WalkEnd::Capped => write!(f, "frame limit reached"),
            WalkEnd::LinkFailed(err) => write!(f, "frame query failed: {err}"),
            WalkEnd::Stopped => write!(f, "stopped by caller"),
        }
    }
}
