use windows::Win32::Graphics::Direct3D11::{
    D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE, D3D11_BLEND_DESC,
    D3D11_COMPARISON_ALWAYS, D3D11_COMPARISON_FUNC, D3D11_COMPARISON_LESS,
    D3D11_COMPARISON_LESS_EQUAL, D3D11_COMPARISON_NEVER, D3D11_CULL_BACK, D3D11_CULL_MODE,
    D3D11_CULL_NONE, D3D11_DEPTH_STENCIL_DESC, D3D11_DEPTH_WRITE_MASK_ALL,
    D3D11_DEPTH_WRITE_MASK_ZERO, D3D11_FILL_SOLID, D3D11_FILTER, D3D11_FILTER_MIN_MAG_MIP_LINEAR,
    D3D11_FILTER_MIN_MAG_MIP_POINT, D3D11_INPUT_ELEMENT_DESC,
    D3D11_INPUT_PER_VERTEX_DATA, D3D11_RASTERIZER_DESC, D3D11_RESOURCE_MISC_GENERATE_MIPS,
    D3D11_SAMPLER_DESC, D3D11_TEXTURE_ADDRESS_BORDER, D3D11_TEXTURE_ADDRESS_CLAMP,
    D3D11_TEXTURE_ADDRESS_MODE, D3D11_TEXTURE2D_DESC, D3D11_USAGE_DEFAULT, ID3D11Device,
    ID3D11DeviceContext,
};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_FORMAT, DXGI_FORMAT_R32G32_FLOAT, DXGI_FORMAT_R32G32B32_FLOAT, DXGI_SAMPLE_DESC,
};
use windows::core::PCSTR;

use crate::error::{MirrorError, MirrorResult};
use crate::gpu::RawDevice;
use crate::pipeline::{
    AttributeFormat, BlendConfig, ComparisonFunc, CullMode, DepthStencilConfig, RasterizerConfig,
    SamplerConfig, SamplerFilter, TextureAddress, VertexAttribute,
};

/// Maps a `windows::core::Result` onto [`MirrorError::Hresult`] tagged with
/// the failing operation.
pub(crate) trait CheckHresult<T> {
    fn check(self, operation: &'static str) -> MirrorResult<T>;
}

impl<T> CheckHresult<T> for windows::core::Result<T> {
    fn check(self, operation: &'static str) -> MirrorResult<T> {
        self.map_err(|err| MirrorError::from_windows(operation, err))
    }
}

/// Unwraps the out-parameter of a create call that reported success.
pub(crate) fn created<T>(object: Option<T>, operation: &'static str) -> MirrorResult<T> {
    object.ok_or(MirrorError::MissingObject(operation))
}

/// Takes a session reference to the host's device. The host keeps its own.
pub(crate) fn device_from_host(raw: RawDevice) -> MirrorResult<ID3D11Device> {
    let ptr = raw.as_ptr();
    let borrowed = unsafe { ID3D11Device::from_raw_borrowed(&ptr) };
    borrowed
        .cloned()
        .ok_or_else(|| MirrorError::Platform(anyhow::anyhow!("host passed a null ID3D11Device")))
}

pub(crate) fn immediate_context(device: &ID3D11Device) -> MirrorResult<ID3D11DeviceContext> {
    unsafe { device.GetImmediateContext() }.check("GetImmediateContext")
}

pub(crate) fn rasterizer_desc(config: &RasterizerConfig) -> D3D11_RASTERIZER_DESC {
    D3D11_RASTERIZER_DESC {
        FillMode: D3D11_FILL_SOLID,
        CullMode: cull_mode(config.cull_mode),
        FrontCounterClockwise: config.front_counter_clockwise.into(),
        DepthClipEnable: config.depth_clip.into(),
        MultisampleEnable: config.multisample.into(),
        ..Default::default()
    }
}

fn cull_mode(mode: CullMode) -> D3D11_CULL_MODE {
    match mode {
        CullMode::Back => D3D11_CULL_BACK,
        CullMode::None => D3D11_CULL_NONE,
    }
}

fn comparison(func: ComparisonFunc) -> D3D11_COMPARISON_FUNC {
    match func {
        ComparisonFunc::Less => D3D11_COMPARISON_LESS,
        ComparisonFunc::LessEqual => D3D11_COMPARISON_LESS_EQUAL,
        ComparisonFunc::Always => D3D11_COMPARISON_ALWAYS,
    }
}

pub(crate) fn depth_stencil_desc(config: &DepthStencilConfig) -> D3D11_DEPTH_STENCIL_DESC {
    D3D11_DEPTH_STENCIL_DESC {
        DepthEnable: config.depth_test.into(),
        DepthWriteMask: if config.depth_write {
            D3D11_DEPTH_WRITE_MASK_ALL
        } else {
            D3D11_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: comparison(config.comparison),
        StencilEnable: false.into(),
        ..Default::default()
    }
}

pub(crate) fn blend_desc(config: &BlendConfig) -> D3D11_BLEND_DESC {
    let mut desc = D3D11_BLEND_DESC::default();
    desc.RenderTarget[0].BlendEnable = config.enabled.into();
    desc.RenderTarget[0].RenderTargetWriteMask = config.write_mask;
    desc
}

fn address_mode(address: TextureAddress) -> D3D11_TEXTURE_ADDRESS_MODE {
    match address {
        TextureAddress::Clamp => D3D11_TEXTURE_ADDRESS_CLAMP,
        TextureAddress::Border => D3D11_TEXTURE_ADDRESS_BORDER,
    }
}

fn filter(filter: SamplerFilter) -> D3D11_FILTER {
    match filter {
        SamplerFilter::Point => D3D11_FILTER_MIN_MAG_MIP_POINT,
        SamplerFilter::Trilinear => D3D11_FILTER_MIN_MAG_MIP_LINEAR,
    }
}

pub(crate) fn sampler_desc(config: &SamplerConfig) -> D3D11_SAMPLER_DESC {
    let address = address_mode(config.address);
    D3D11_SAMPLER_DESC {
        Filter: filter(config.filter),
        AddressU: address,
        AddressV: address,
        AddressW: address,
        MipLODBias: 0.0,
        MaxAnisotropy: 1,
        ComparisonFunc: D3D11_COMPARISON_NEVER,
        BorderColor: config.border_color,
        MinLOD: 0.0,
        MaxLOD: config.max_lod,
    }
}

fn attribute_format(format: AttributeFormat) -> DXGI_FORMAT {
    match format {
        AttributeFormat::Float32x2 => DXGI_FORMAT_R32G32_FLOAT,
        AttributeFormat::Float32x3 => DXGI_FORMAT_R32G32B32_FLOAT,
    }
}

/// Input element descriptors for `layout`. Semantic names must outlive the
/// returned descriptors, which holds for the `'static` names used here.
pub(crate) fn input_elements(layout: &[VertexAttribute]) -> Vec<D3D11_INPUT_ELEMENT_DESC> {
    layout
        .iter()
        .map(|attribute| D3D11_INPUT_ELEMENT_DESC {
            SemanticName: semantic_name(attribute.semantic),
            SemanticIndex: 0,
            Format: attribute_format(attribute.format),
            InputSlot: 0,
            AlignedByteOffset: attribute.offset,
            InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        })
        .collect()
}

fn semantic_name(semantic: &'static str) -> PCSTR {
    match semantic {
        "POSITION" => windows::core::s!("POSITION"),
        "TEXCOORD" => windows::core::s!("TEXCOORD"),
        _ => windows::core::s!(""),
    }
}

/// Mirror texture shaped like a captured frame: full mip chain, bindable as
/// shader resource and render target so mips can be generated.
pub(crate) fn mirror_texture_desc(
    frame: &D3D11_TEXTURE2D_DESC,
    mip_levels: u32,
) -> D3D11_TEXTURE2D_DESC {
    D3D11_TEXTURE2D_DESC {
        Width: frame.Width,
        Height: frame.Height,
        MipLevels: mip_levels,
        ArraySize: 1,
        Format: frame.Format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: (D3D11_BIND_SHADER_RESOURCE.0 | D3D11_BIND_RENDER_TARGET.0) as u32,
        CPUAccessFlags: 0,
        MiscFlags: D3D11_RESOURCE_MISC_GENERATE_MIPS.0 as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use crate::pipeline::{PipelineDesc, QUAD_VERTEX_LAYOUT, WRITE_MASK_ALL};
    use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_B8G8R8A8_UNORM;

    #[test]
    fn default_states_translate_to_d3d11_descs() {
        let desc = PipelineDesc::from_config(&MirrorConfig::default());

        let rs = rasterizer_desc(&desc.rasterizer);
        assert_eq!(rs.CullMode, D3D11_CULL_BACK);
        assert!(rs.DepthClipEnable.as_bool());
        assert!(!rs.FrontCounterClockwise.as_bool());

        let ds = depth_stencil_desc(&desc.depth_stencil);
        assert!(ds.DepthEnable.as_bool());
        assert_eq!(ds.DepthWriteMask, D3D11_DEPTH_WRITE_MASK_ZERO);
        assert_eq!(ds.DepthFunc, D3D11_COMPARISON_LESS_EQUAL);

        let bs = blend_desc(&desc.blend);
        assert!(!bs.RenderTarget[0].BlendEnable.as_bool());
        assert_eq!(bs.RenderTarget[0].RenderTargetWriteMask, WRITE_MASK_ALL);

        let ss = sampler_desc(&desc.sampler);
        assert_eq!(ss.AddressU, D3D11_TEXTURE_ADDRESS_BORDER);
        assert_eq!(ss.Filter, D3D11_FILTER_MIN_MAG_MIP_POINT);
        assert_eq!(ss.MaxLOD, 0.0);
        assert_eq!(ss.BorderColor, [0.0; 4]);
    }

    #[test]
    fn input_layout_matches_quad_vertex() {
        let elements = input_elements(&QUAD_VERTEX_LAYOUT);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].Format, DXGI_FORMAT_R32G32B32_FLOAT);
        assert_eq!(elements[1].Format, DXGI_FORMAT_R32G32_FLOAT);
        assert_eq!(elements[1].AlignedByteOffset, 12);
    }

    #[test]
    fn mirror_desc_copies_frame_geometry_with_mips() {
        let frame = D3D11_TEXTURE2D_DESC {
            Width: 1920,
            Height: 1080,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            ..Default::default()
        };
        let mirror = mirror_texture_desc(&frame, 12);
        assert_eq!((mirror.Width, mirror.Height), (1920, 1080));
        assert_eq!(mirror.Format, DXGI_FORMAT_B8G8R8A8_UNORM);
        assert_eq!(mirror.MipLevels, 12);
        assert_eq!(
            mirror.MiscFlags,
            D3D11_RESOURCE_MISC_GENERATE_MIPS.0 as u32
        );
    }
}
