//! State written by the host from arbitrary threads and read by the render
//! hook.
//!
//! Setters publish a complete new snapshot and the render hook loads one
//! snapshot per call, so a frame never sees half of a matrix and neither
//! side ever waits on the other. A value set concurrently with a render
//! call may land on the following frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::geometry::{TransformMatrix, ViewportRect};

#[derive(Debug)]
pub struct HostState {
    transform: ArcSwap<TransformMatrix>,
    viewport: ArcSwapOption<ViewportRect>,
    /// Width in the high half, height in the low half.
    captured_size: AtomicU64,
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}

impl HostState {
    pub fn new() -> Self {
        Self {
            transform: ArcSwap::from_pointee(TransformMatrix::default()),
            viewport: ArcSwapOption::empty(),
            captured_size: AtomicU64::new(0),
        }
    }

    pub fn set_transform(&self, transform: TransformMatrix) {
        self.transform.store(Arc::new(transform));
    }

    pub fn transform(&self) -> TransformMatrix {
        **self.transform.load()
    }

    pub fn set_viewport(&self, viewport: ViewportRect) {
        self.viewport.store(Some(Arc::new(viewport)));
    }

    pub fn viewport(&self) -> Option<ViewportRect> {
        self.viewport.load().as_deref().copied()
    }

    pub(crate) fn publish_captured_size(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.captured_size.store(packed, Ordering::Release);
    }

    pub(crate) fn reset_captured_size(&self) {
        self.captured_size.store(0, Ordering::Release);
    }

    /// Mirror texture dimensions, `(0, 0)` until the first frame arrives.
    pub fn captured_size(&self) -> (u32, u32) {
        let packed = self.captured_size.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }

    pub fn captured_width(&self) -> u32 {
        self.captured_size().0
    }

    pub fn captured_height(&self) -> u32 {
        self.captured_size().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_zero_transform_and_no_viewport() {
        let state = HostState::new();
        assert_eq!(state.transform(), TransformMatrix::ZERO);
        assert_eq!(state.viewport(), None);
        assert_eq!(state.captured_size(), (0, 0));
    }

    #[test]
    fn last_transform_write_wins() {
        let state = HostState::new();
        state.set_transform(TransformMatrix::ZERO);
        state.set_transform(TransformMatrix::IDENTITY);
        assert_eq!(state.transform(), TransformMatrix::IDENTITY);
    }

    #[test]
    fn viewport_is_absent_until_set() {
        let state = HostState::new();
        assert_eq!(state.viewport(), None);
        let rect = ViewportRect::new(0.0, 0.0, 1280.0, 720.0);
        state.set_viewport(rect);
        assert_eq!(state.viewport(), Some(rect));
    }

    #[test]
    fn captured_size_round_trips_full_u32_range() {
        let state = HostState::new();
        state.publish_captured_size(u32::MAX, 1);
        assert_eq!(state.captured_width(), u32::MAX);
        assert_eq!(state.captured_height(), 1);
        state.reset_captured_size();
        assert_eq!(state.captured_size(), (0, 0));
    }

    #[test]
    fn setters_from_other_threads_are_visible() {
        let state = Arc::new(HostState::new());
        let writer = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                state.set_transform(TransformMatrix::IDENTITY);
                state.set_viewport(ViewportRect::new(1.0, 2.0, 3.0, 4.0));
            })
        };
        writer.join().expect("writer thread panicked");
        assert_eq!(state.transform(), TransformMatrix::IDENTITY);
        assert_eq!(state.viewport(), Some(ViewportRect::new(1.0, 2.0, 3.0, 4.0)));
    }
}
