pub mod capture;
pub mod compositor;
pub mod config;
pub mod device;
pub(crate) mod env_config;
pub mod error;
pub mod ffi;
pub mod geometry;
pub mod gpu;
pub mod host_state;
pub mod logging;
pub mod pipeline;
mod platform;

#[cfg(test)]
mod testing;

pub use capture::{FrameDesc, FrameInfo, FrameSource, PollOutcome};
pub use compositor::FrameCompositor;
pub use config::MirrorConfig;
pub use device::{DeviceEventKind, DeviceManager, RendererKind};
pub use error::{MirrorError, MirrorErrorClass, MirrorResult};
pub use geometry::{QuadVertex, TransformMatrix, ViewportRect};
pub use gpu::{CopyRegion, GpuContext, GraphicsPlatform, RawDevice};
pub use host_state::HostState;
pub use pipeline::PipelineDesc;
