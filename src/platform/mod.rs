#[cfg(target_os = "windows")]
pub(crate) mod windows;

#[cfg(target_os = "windows")]
pub(crate) type NativePlatform = windows::D3D11Platform;

#[cfg(not(target_os = "windows"))]
pub(crate) type NativePlatform = unsupported::UnsupportedPlatform;

#[cfg(not(target_os = "windows"))]
mod unsupported {
    use crate::capture::{FrameDesc, FrameSource, PollOutcome};
    use crate::device::RendererKind;
    use crate::error::{MirrorError, MirrorResult};
    use crate::geometry::{TransformMatrix, ViewportRect};
    use crate::gpu::{CopyRegion, GpuContext, GraphicsPlatform, RawDevice};
    use crate::pipeline::PipelineDesc;

    /// Accepts Direct3D 11 device events so misconfigured hosts get a clear
    /// error, but can never produce a context.
    #[derive(Debug, Default)]
    pub(crate) struct UnsupportedPlatform;

    pub(crate) enum NoContext {}
    pub(crate) enum NoSource {}
    pub(crate) enum NoResource {}

    impl GpuContext for NoContext {
        type Frame = NoResource;
        type Mirror = NoResource;

        fn bind_render_states(&mut self) {
            match *self {}
        }

        fn describe_frame(&self, frame: &NoResource) -> FrameDesc {
            match *frame {}
        }

        fn create_mirror(&mut self, frame: &NoResource, _: u32) -> MirrorResult<NoResource> {
            match *frame {}
        }

        fn copy_to_mirror(&mut self, frame: &NoResource, _: &NoResource, _: CopyRegion) {
            match *frame {}
        }

        fn generate_mips(&mut self, mirror: &NoResource) {
            match *mirror {}
        }

        fn write_transform(&mut self, _: &TransformMatrix) -> MirrorResult<()> {
            match *self {}
        }

        fn apply_viewport(&mut self, _: &ViewportRect) {
            match *self {}
        }

        fn draw_quad(&mut self, _: Option<&NoResource>) {
            match *self {}
        }
    }

    impl FrameSource for NoSource {
        type Frame = NoResource;

        fn poll_next_frame(&mut self, _: u32) -> MirrorResult<PollOutcome<NoResource>> {
            match *self {}
        }

        fn release_frame(&mut self, frame: NoResource) -> MirrorResult<()> {
            match frame {}
        }
    }

    impl GraphicsPlatform for UnsupportedPlatform {
        type Context = NoContext;
        type Source = NoSource;

        fn renderer(&self) -> RendererKind {
            RendererKind::Direct3D11
        }

        fn create_context(&self, _: RawDevice, _: &PipelineDesc) -> MirrorResult<NoContext> {
            Err(MirrorError::Unsupported(
                "desktop duplication is only available on Windows".into(),
            ))
        }

        fn open_source(&self, context: &NoContext) -> MirrorResult<NoSource> {
            match *context {}
        }
    }
}
