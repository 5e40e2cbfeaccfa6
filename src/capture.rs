//! Capture source abstraction: a non-blocking poll that either yields a
//! desktop frame or reports that nothing new has been presented.

use crate::error::MirrorResult;

/// Render calls never wait for screen activity.
pub const POLL_TIMEOUT_MS: u32 = 0;

/// Size and pixel format of a captured frame or mirror texture. `format` is
/// the platform's raw format code (a `DXGI_FORMAT` on Windows).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameDesc {
    pub width: u32,
    pub height: u32,
    pub format: u32,
}

impl FrameDesc {
    pub fn same_geometry(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }
}

/// Metadata reported alongside an acquired frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Desktop updates folded into this frame since the last acquire.
    pub accumulated_frames: u32,
    /// Performance-counter timestamp of the last present, `0` when only the
    /// pointer moved.
    pub last_present_qpc: i64,
}

#[derive(Debug)]
pub enum PollOutcome<F> {
    Frame(F, FrameInfo),
    /// Nothing new within the timeout. Expected on most render calls.
    Empty,
}

pub trait FrameSource {
    /// A frame owned by the capture subsystem for one poll cycle.
    type Frame;

    /// Non-blocking poll for the next frame. Errors are fatal.
    fn poll_next_frame(&mut self, timeout_ms: u32) -> MirrorResult<PollOutcome<Self::Frame>>;

    /// Drops the frame and tells the capture subsystem it was consumed.
    /// Must be called exactly once for every [`PollOutcome::Frame`] before
    /// the next poll.
    fn release_frame(&mut self, frame: Self::Frame) -> MirrorResult<()>;
}
