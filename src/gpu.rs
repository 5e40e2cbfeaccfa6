//! The seam between the platform-independent session logic and a concrete
//! graphics API.

use std::ffi::c_void;

use crate::capture::{FrameDesc, FrameSource};
use crate::device::RendererKind;
use crate::error::MirrorResult;
use crate::geometry::{TransformMatrix, ViewportRect};
use crate::pipeline::PipelineDesc;

/// Device pointer handed over by the host renderer. The host keeps
/// ownership; platforms take their own reference for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawDevice(*mut c_void);

impl RawDevice {
    pub fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }
}

/// Axis-aligned texel rectangle (right/bottom exclusive) used for the mip 0
/// region copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CopyRegion {
    pub fn covering(desc: &FrameDesc) -> Self {
        Self {
            left: 0,
            top: 0,
            right: desc.width,
            bottom: desc.height,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Clips the region so it never reads outside a frame of `desc` size.
    pub fn clamped_to(&self, desc: &FrameDesc) -> Self {
        Self {
            left: self.left.min(desc.width),
            top: self.top.min(desc.height),
            right: self.right.min(desc.width),
            bottom: self.bottom.min(desc.height),
        }
    }
}

/// Long-lived pipeline state plus the per-frame operations the compositor
/// issues against it. Implementations own the device reference.
pub trait GpuContext {
    /// Captured frame texture, as produced by the paired [`FrameSource`].
    type Frame;
    /// Mirror texture together with its sampling view.
    type Mirror;

    /// Re-applies depth-stencil, rasterizer and blend state.
    fn bind_render_states(&mut self);

    fn describe_frame(&self, frame: &Self::Frame) -> FrameDesc;

    /// Creates a mipmapped, sampleable copy target shaped like `frame`.
    /// Either both texture and view are created or neither is.
    fn create_mirror(&mut self, frame: &Self::Frame, mip_levels: u32)
    -> MirrorResult<Self::Mirror>;

    fn copy_to_mirror(&mut self, frame: &Self::Frame, mirror: &Self::Mirror, region: CopyRegion);

    fn generate_mips(&mut self, mirror: &Self::Mirror);

    fn write_transform(&mut self, transform: &TransformMatrix) -> MirrorResult<()>;

    fn apply_viewport(&mut self, viewport: &ViewportRect);

    /// Binds geometry, program, sampler and `mirror` (or nothing), then
    /// draws the six quad vertices.
    fn draw_quad(&mut self, mirror: Option<&Self::Mirror>);
}

pub trait GraphicsPlatform {
    type Context: GpuContext;
    type Source: FrameSource<Frame = <Self::Context as GpuContext>::Frame>;

    /// The host renderer kind this platform can drive.
    fn renderer(&self) -> RendererKind;

    fn create_context(&self, device: RawDevice, desc: &PipelineDesc)
    -> MirrorResult<Self::Context>;

    /// Opens the capture source on the device owned by `context`.
    fn open_source(&self, context: &Self::Context) -> MirrorResult<Self::Source>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_region_clamps_to_smaller_frame() {
        let region = CopyRegion::covering(&FrameDesc {
            width: 1920,
            height: 1080,
            format: 87,
        });
        let clamped = region.clamped_to(&FrameDesc {
            width: 1280,
            height: 1440,
            format: 87,
        });
        assert_eq!(clamped.width(), 1280);
        assert_eq!(clamped.height(), 1080);
        assert!(!clamped.is_empty());
    }

    #[test]
    fn null_device_is_detected() {
        assert!(RawDevice::null().is_null());
        let mut value = 0u8;
        assert!(!RawDevice::new(&mut value as *mut u8 as *mut c_void).is_null());
    }
}
