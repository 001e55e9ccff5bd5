//! Frame-pointer chain walking.
//!
//! Starting from the innermost frame, each frame pointer is used to query the
//! frame record it points at, which yields the caller's return address and
//! frame pointer. The walk stops at a null parent frame pointer, at the first
//! failed query, or at the frame cap, whichever comes first.

use std::ops::ControlFlow;

use tracing::{debug, trace};

use crate::error::FramewalkResult;
use crate::types::{Address, FrameLink, StackFrame, WalkEnd};

/// Upper bound on frames walked, guarding against cyclic or corrupted chains.
pub const MAX_FRAMES: usize = 400;

/// Source of frame records for the walker.
pub trait FrameSource
{
    /// Query the frame record at `frame_pointer`.
    fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>;
}

/// Frames collected by a walk, innermost first, and why it stopped.
#[derive(Debug)]
pub struct Walk
{
    pub frames: Vec<StackFrame>,
    pub end: WalkEnd,
}

/// Bounded frame-pointer walker
#[derive(Debug, Clone, Copy)]
pub struct FrameWalker
{
    max_frames: usize,
}

impl Default for FrameWalker
{
    fn default() -> Self
    {
        Self::new(MAX_FRAMES)
    }
}

impl FrameWalker
{
    /// Walker emitting at most `max_frames` frames (at least one).
    pub fn new(max_frames: usize) -> Self
    {
        Self {
            max_frames: max_frames.max(1),
        }
    }

    pub fn max_frames(&self) -> usize
    {
        self.max_frames
    }

    /// Walk from `start`, calling `visit` with each frame as it is reached.
    ///
    /// Returning `ControlFlow::Break` from `visit` ends the walk with
    /// [`WalkEnd::Stopped`] before the frame's record is queried.
    pub fn walk_with<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        start: StackFrame,
        mut visit: impl FnMut(usize, &StackFrame) -> ControlFlow<()>,
    ) -> Walk
    {
        let mut frames = Vec::new();
        let mut current = start;

        let end = loop {
            let flow = visit(frames.len(), &current);
            frames.push(current);
            if flow.is_break() {
                break WalkEnd::Stopped;
            }

            let link = match source.read_link(current.fp) {
                Ok(link) => link,
                Err(err) => {
                    debug!(fp = %current.fp, error = %err, "frame query failed");
                    break WalkEnd::LinkFailed(err);
                }
            };
            trace!(fp = %current.fp, ret = %link.return_address, parent = %link.parent_fp, "frame link");

            if link.parent_fp.is_null() {
                break WalkEnd::Terminated;
            }
            if frames.len() >= self.max_frames {
                break WalkEnd::Capped;
            }
            current = link.parent();
        };

        debug!(frames = frames.len(), end = %end, "walk finished");
        Walk { frames, end }
    }

    /// Walk from `start` and collect the frames.
    pub fn walk<S: FrameSource + ?Sized>(&self, source: &mut S, start: StackFrame) -> Walk
    {
        self.walk_with(source, start, |_, _| ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;
    use crate::error::FramewalkError;

    /// Frame records keyed by frame pointer.
    struct Records(HashMap<u64, (u64, u64)>);

    impl FrameSource for Records
    {
        fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>
        {
            self.0
                .get(&frame_pointer.value())
                .map(|&(ret, parent)| FrameLink {
                    return_address: Address::from(ret),
                    parent_fp: Address::from(parent),
                })
                .ok_or_else(|| FramewalkError::ReadMemoryFailed {
                    address: frame_pointer,
                    len: 16,
                    details: "unmapped".into(),
                })
        }
    }

    fn start() -> StackFrame
    {
        StackFrame::new(Address::from(0x4000), Address::from(0x1000))
    }

    #[test]
    fn test_single_frame_chain()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4100, 0))]));
        let walk = FrameWalker::default().walk(&mut records, start());
        assert_eq!(walk.frames, vec![start()]);
        assert!(matches!(walk.end, WalkEnd::Terminated));
    }

    #[test]
    fn test_return_address_becomes_next_ip()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4100, 0x1100)), (0x1100, (0x4200, 0))]));
        let walk = FrameWalker::default().walk(&mut records, start());
        assert_eq!(walk.frames[1], StackFrame::new(Address::from(0x4100), Address::from(0x1100)));
        assert_eq!(walk.frames.len(), 2);
    }

    #[test]
    fn test_self_loop_is_capped()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4000, 0x1000))]));
        let walk = FrameWalker::new(25).walk(&mut records, start());
        assert_eq!(walk.frames.len(), 25);
        assert!(walk.end.is_capped());
    }

    #[test]
    fn test_chain_ending_exactly_at_cap_is_terminated()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4100, 0x1100)), (0x1100, (0x4200, 0))]));
        let walk = FrameWalker::new(2).walk(&mut records, start());
        assert_eq!(walk.frames.len(), 2);
        assert!(matches!(walk.end, WalkEnd::Terminated));
    }

    #[test]
    fn test_failed_query_keeps_frames()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4100, 0x2000))]));
        let walk = FrameWalker::default().walk(&mut records, start());
        assert_eq!(walk.frames.len(), 2);
        assert!(matches!(walk.end, WalkEnd::LinkFailed(FramewalkError::ReadMemoryFailed { .. })));
    }

    #[test]
    fn test_zero_cap_still_emits_first_frame()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4000, 0x1000))]));
        let walk = FrameWalker::new(0).walk(&mut records, start());
        assert_eq!(walk.frames.len(), 1);
        assert!(walk.end.is_capped());
    }

    #[test]
    fn test_visit_sees_frames_in_order()
    {
        let mut records = Records(HashMap::from([(0x1000, (0x4100, 0x1100)), (0x1100, (0x4200, 0))]));
        let mut seen = Vec::new();
        FrameWalker::default().walk_with(&mut records, start(), |index, frame| {
            seen.push((index, frame.ip.value()));
            ControlFlow::Continue(())
        });
        assert_eq!(seen, vec![(0, 0x4000), (1, 0x4100)]);
    }

    /// Counts queries so a test can see the walk stopped issuing them.
    struct Counting(Records, usize);

    impl FrameSource for Counting
    {
        fn read_link(&mut self, frame_pointer: Address) -> FramewalkResult<FrameLink>
        {
            self.1 += 1;
            self.0.read_link(frame_pointer)
        }
    }

    #[test]
    fn test_visitor_break_stops_querying()
    {
        // Self-loop: without the break this would run to the cap.
        let mut source = Counting(Records(HashMap::from([(0x1000, (0x4000, 0x1000))])), 0);
        let walk = FrameWalker::default().walk_with(&mut source, start(), |index, _| {
            if index == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(walk.frames.len(), 3);
        assert!(matches!(walk.end, WalkEnd::Stopped));
        assert_eq!(source.1, 2);
    }
}
