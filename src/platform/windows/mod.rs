pub(crate) mod d3d11;
pub(crate) mod duplication;
pub(crate) mod pipeline;
pub(crate) mod shader;

use crate::device::RendererKind;
use crate::error::MirrorResult;
use crate::gpu::{GraphicsPlatform, RawDevice};
use crate::pipeline::PipelineDesc;

use duplication::OutputDuplicationSource;
use pipeline::D3D11Context;

/// Direct3D 11 rendering with DXGI desktop duplication as the frame source.
#[derive(Debug, Default)]
pub(crate) struct D3D11Platform;

impl GraphicsPlatform for D3D11Platform {
    type Context = D3D11Context;
    type Source = OutputDuplicationSource;

    fn renderer(&self) -> RendererKind {
        RendererKind::Direct3D11
    }

    fn create_context(&self, device: RawDevice, desc: &PipelineDesc) -> MirrorResult<D3D11Context> {
        D3D11Context::new(device, desc)
    }

    fn open_source(&self, context: &D3D11Context) -> MirrorResult<OutputDuplicationSource> {
        OutputDuplicationSource::open(context.device())
    }
}
