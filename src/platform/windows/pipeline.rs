use tracing::debug;
use windows::Win32::Graphics::Direct3D::D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST;
use windows::Win32::Graphics::Direct3D11::{
    D3D11_BIND_CONSTANT_BUFFER, D3D11_BIND_VERTEX_BUFFER, D3D11_BOX, D3D11_BUFFER_DESC,
    D3D11_CPU_ACCESS_WRITE, D3D11_MAP_WRITE_DISCARD, D3D11_MAPPED_SUBRESOURCE,
    D3D11_SUBRESOURCE_DATA, D3D11_TEXTURE2D_DESC, D3D11_USAGE_DYNAMIC, D3D11_USAGE_IMMUTABLE,
    D3D11_VIEWPORT, ID3D11BlendState, ID3D11Buffer, ID3D11DepthStencilState, ID3D11Device,
    ID3D11DeviceContext, ID3D11InputLayout, ID3D11PixelShader, ID3D11RasterizerState,
    ID3D11SamplerState, ID3D11ShaderResourceView, ID3D11Texture2D, ID3D11VertexShader,
};

use crate::capture::FrameDesc;
use crate::error::{MirrorError, MirrorResult, tolerate};
use crate::geometry::{QUAD_VERTEX_COUNT, TransformMatrix, ViewportRect};
use crate::gpu::{CopyRegion, GpuContext, RawDevice};
use crate::pipeline::{PipelineDesc, VertexAttribute};

use super::d3d11::{self, CheckHresult, created};
use super::shader;

/// Mirror texture plus the view the pixel stage samples. The view is
/// declared first so it is released before the texture.
pub(crate) struct D3D11Mirror {
    view: ID3D11ShaderResourceView,
    texture: ID3D11Texture2D,
}

// The mirror is only touched from the host render thread; the device lock in
// `ffi` serializes every access.
unsafe impl Send for D3D11Mirror {}

/// Shader stages and layout. Each piece is absent when its bytecode could
/// not be produced; draws then run with whatever the host left bound.
#[derive(Default)]
struct QuadProgram {
    vertex_shader: Option<ID3D11VertexShader>,
    pixel_shader: Option<ID3D11PixelShader>,
    input_layout: Option<ID3D11InputLayout>,
}

/// Every long-lived object of an active session. Declaration order is
/// release order: pipeline objects, then the immediate context, then the
/// session's device reference.
pub(crate) struct D3D11Context {
    program: QuadProgram,
    sampler: ID3D11SamplerState,
    blend: ID3D11BlendState,
    depth_stencil: ID3D11DepthStencilState,
    rasterizer: ID3D11RasterizerState,
    vertex_buffer: ID3D11Buffer,
    constant_buffer: ID3D11Buffer,
    vertex_stride: u32,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
}

unsafe impl Send for D3D11Context {}

impl D3D11Context {
    pub(crate) fn new(raw: RawDevice, desc: &PipelineDesc) -> MirrorResult<Self> {
        let device = d3d11::device_from_host(raw)?;
        let context = d3d11::immediate_context(&device)?;

        let mut rasterizer = None;
        unsafe {
            device.CreateRasterizerState(
                &d3d11::rasterizer_desc(&desc.rasterizer),
                Some(&mut rasterizer),
            )
        }
        .check("CreateRasterizerState")?;
        let rasterizer = created(rasterizer, "CreateRasterizerState")?;

        let mut depth_stencil = None;
        unsafe {
            device.CreateDepthStencilState(
                &d3d11::depth_stencil_desc(&desc.depth_stencil),
                Some(&mut depth_stencil),
            )
        }
        .check("CreateDepthStencilState")?;
        let depth_stencil = created(depth_stencil, "CreateDepthStencilState")?;

        let mut blend = None;
        unsafe { device.CreateBlendState(&d3d11::blend_desc(&desc.blend), Some(&mut blend)) }
            .check("CreateBlendState")?;
        let blend = created(blend, "CreateBlendState")?;

        let mut sampler = None;
        unsafe {
            device.CreateSamplerState(&d3d11::sampler_desc(&desc.sampler), Some(&mut sampler))
        }
        .check("CreateSamplerState")?;
        let sampler = created(sampler, "CreateSamplerState")?;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(desc.vertices);
        let vertex_desc = D3D11_BUFFER_DESC {
            ByteWidth: vertex_bytes.len() as u32,
            Usage: D3D11_USAGE_IMMUTABLE,
            BindFlags: D3D11_BIND_VERTEX_BUFFER.0 as u32,
            ..Default::default()
        };
        let vertex_data = D3D11_SUBRESOURCE_DATA {
            pSysMem: vertex_bytes.as_ptr().cast(),
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        };
        let mut vertex_buffer = None;
        unsafe { device.CreateBuffer(&vertex_desc, Some(&vertex_data), Some(&mut vertex_buffer)) }
            .check("CreateBuffer")?;
        let vertex_buffer = created(vertex_buffer, "CreateBuffer")?;

        let constant_desc = D3D11_BUFFER_DESC {
            ByteWidth: TransformMatrix::BYTE_SIZE as u32,
            Usage: D3D11_USAGE_DYNAMIC,
            BindFlags: D3D11_BIND_CONSTANT_BUFFER.0 as u32,
            CPUAccessFlags: D3D11_CPU_ACCESS_WRITE.0 as u32,
            ..Default::default()
        };
        let mut constant_buffer = None;
        unsafe { device.CreateBuffer(&constant_desc, None, Some(&mut constant_buffer)) }
            .check("CreateBuffer")?;
        let constant_buffer = created(constant_buffer, "CreateBuffer")?;

        let program = create_program(&device, desc.layout)?;

        Ok(Self {
            program,
            sampler,
            blend,
            depth_stencil,
            rasterizer,
            vertex_buffer,
            constant_buffer,
            vertex_stride: desc.vertex_stride,
            context,
            device,
        })
    }

    pub(crate) fn device(&self) -> &ID3D11Device {
        &self.device
    }
}

fn create_program(device: &ID3D11Device, layout: &[VertexAttribute]) -> MirrorResult<QuadProgram> {
    let mut program = QuadProgram::default();

    if let Some(bytecode) = tolerate("vertex", shader::vertex_bytecode())? {
        let mut vertex_shader = None;
        unsafe { device.CreateVertexShader(bytecode, None, Some(&mut vertex_shader)) }
            .check("CreateVertexShader")?;
        program.vertex_shader = Some(created(vertex_shader, "CreateVertexShader")?);

        let elements = d3d11::input_elements(layout);
        let mut input_layout = None;
        unsafe { device.CreateInputLayout(&elements, bytecode, Some(&mut input_layout)) }
            .check("CreateInputLayout")?;
        program.input_layout = Some(created(input_layout, "CreateInputLayout")?);
    }

    if let Some(bytecode) = tolerate("pixel", shader::pixel_bytecode())? {
        let mut pixel_shader = None;
        unsafe { device.CreatePixelShader(bytecode, None, Some(&mut pixel_shader)) }
            .check("CreatePixelShader")?;
        program.pixel_shader = Some(created(pixel_shader, "CreatePixelShader")?);
    }

    debug!(
        vertex = program.vertex_shader.is_some(),
        pixel = program.pixel_shader.is_some(),
        "quad program ready"
    );
    Ok(program)
}

fn texture_desc(texture: &ID3D11Texture2D) -> D3D11_TEXTURE2D_DESC {
    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { texture.GetDesc(&mut desc) };
    desc
}

impl GpuContext for D3D11Context {
    type Frame = ID3D11Texture2D;
    type Mirror = D3D11Mirror;

    fn bind_render_states(&mut self) {
        unsafe {
            self.context.OMSetDepthStencilState(&self.depth_stencil, 0);
            self.context.RSSetState(&self.rasterizer);
            self.context.OMSetBlendState(&self.blend, None, 0xFFFF_FFFF);
        }
    }

    fn describe_frame(&self, frame: &ID3D11Texture2D) -> FrameDesc {
        let desc = texture_desc(frame);
        FrameDesc {
            width: desc.Width,
            height: desc.Height,
            format: desc.Format.0 as u32,
        }
    }

    fn create_mirror(
        &mut self,
        frame: &ID3D11Texture2D,
        mip_levels: u32,
    ) -> MirrorResult<D3D11Mirror> {
        let desc = d3d11::mirror_texture_desc(&texture_desc(frame), mip_levels);

        let mut texture = None;
        unsafe { self.device.CreateTexture2D(&desc, None, Some(&mut texture)) }
            .check("CreateTexture2D")?;
        let texture = created(texture, "CreateTexture2D")?;

        let mut view = None;
        unsafe { self.device.CreateShaderResourceView(&texture, None, Some(&mut view)) }
            .check("CreateShaderResourceView")?;
        let view = created(view, "CreateShaderResourceView")?;

        Ok(D3D11Mirror { view, texture })
    }

    fn copy_to_mirror(
        &mut self,
        frame: &ID3D11Texture2D,
        mirror: &D3D11Mirror,
        region: CopyRegion,
    ) {
        let source_box = D3D11_BOX {
            left: region.left,
            top: region.top,
            front: 0,
            right: region.right,
            bottom: region.bottom,
            back: 1,
        };
        unsafe {
            self.context.CopySubresourceRegion(
                &mirror.texture,
                0,
                region.left,
                region.top,
                0,
                frame,
                0,
                Some(&source_box),
            );
        }
    }

    fn generate_mips(&mut self, mirror: &D3D11Mirror) {
        unsafe { self.context.GenerateMips(&mirror.view) };
    }

    fn write_transform(&mut self, transform: &TransformMatrix) -> MirrorResult<()> {
        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe {
            self.context.Map(
                &self.constant_buffer,
                0,
                D3D11_MAP_WRITE_DISCARD,
                0,
                Some(&mut mapped),
            )
        }
        .check("Map")?;
        if mapped.pData.is_null() {
            unsafe { self.context.Unmap(&self.constant_buffer, 0) };
            return Err(MirrorError::MissingObject("Map"));
        }
        let bytes = transform.as_bytes();
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.pData.cast::<u8>(), bytes.len());
            self.context.Unmap(&self.constant_buffer, 0);
        }
        Ok(())
    }

    fn apply_viewport(&mut self, viewport: &ViewportRect) {
        let viewport = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        unsafe { self.context.RSSetViewports(Some(&[viewport])) };
    }

    fn draw_quad(&mut self, mirror: Option<&D3D11Mirror>) {
        let ctx = &self.context;
        let offset = 0u32;
        unsafe {
            ctx.IASetVertexBuffers(
                0,
                1,
                Some(&Some(self.vertex_buffer.clone())),
                Some(&self.vertex_stride),
                Some(&offset),
            );
            ctx.IASetInputLayout(self.program.input_layout.as_ref());
            ctx.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            ctx.VSSetConstantBuffers(0, Some(&[Some(self.constant_buffer.clone())]));
            ctx.VSSetShader(self.program.vertex_shader.as_ref(), None);
            ctx.PSSetShader(self.program.pixel_shader.as_ref(), None);
            ctx.PSSetSamplers(0, Some(&[Some(self.sampler.clone())]));
            ctx.PSSetShaderResources(0, Some(&[mirror.map(|m| m.view.clone())]));
            ctx.Draw(QUAD_VERTEX_COUNT, 0);
        }
    }
}
