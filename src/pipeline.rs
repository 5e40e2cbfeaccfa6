//! Platform-independent description of the fixed quad pipeline.
//!
//! The platform layer turns a [`PipelineDesc`] into real GPU state objects
//! exactly once per device session.

use crate::config::MirrorConfig;
use crate::geometry::{QUAD_VERTICES, QuadVertex};

/// Mip levels allocated for the mirror texture, independent of its size.
pub const MIRROR_MIP_LEVELS: u32 = 12;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullMode {
    #[default]
    Back,
    None,
}

impl CullMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "back" => Some(Self::Back),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonFunc {
    Less,
    LessEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureAddress {
    Clamp,
    Border,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplerFilter {
    /// Nearest texel from mip 0 only.
    #[default]
    Point,
    /// Linear min/mag/mip filtering across the generated mip chain.
    Trilinear,
}

impl SamplerFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "point" => Some(Self::Point),
            "trilinear" | "linear" => Some(Self::Trilinear),
            _ => None,
        }
    }

    /// Highest mip level the sampler may read.
    pub fn max_lod(self) -> f32 {
        match self {
            Self::Point => 0.0,
            Self::Trilinear => f32::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterizerConfig {
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_clip: bool,
    pub multisample: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthStencilConfig {
    pub depth_test: bool,
    pub depth_write: bool,
    pub comparison: ComparisonFunc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendConfig {
    pub enabled: bool,
    /// RGBA channel mask, one bit per channel.
    pub write_mask: u8,
}

pub const WRITE_MASK_ALL: u8 = 0x0F;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    pub filter: SamplerFilter,
    pub address: TextureAddress,
    pub border_color: [f32; 4],
    pub max_lod: f32,
}

/// Vertex attribute formats used by the quad layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub semantic: &'static str,
    pub format: AttributeFormat,
    pub offset: u32,
}

pub const QUAD_VERTEX_LAYOUT: [VertexAttribute; 2] = [
    VertexAttribute {
        semantic: "POSITION",
        format: AttributeFormat::Float32x3,
        offset: 0,
    },
    VertexAttribute {
        semantic: "TEXCOORD",
        format: AttributeFormat::Float32x2,
        offset: QuadVertex::TEX_COORD_OFFSET,
    },
];

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineDesc {
    pub rasterizer: RasterizerConfig,
    pub depth_stencil: DepthStencilConfig,
    pub blend: BlendConfig,
    pub sampler: SamplerConfig,
    pub vertices: &'static [QuadVertex],
    pub vertex_stride: u32,
    pub layout: &'static [VertexAttribute],
}

impl PipelineDesc {
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            rasterizer: RasterizerConfig {
                cull_mode: config.cull_mode,
                front_counter_clockwise: false,
                depth_clip: true,
                multisample: true,
            },
            depth_stencil: DepthStencilConfig {
                depth_test: true,
                depth_write: false,
                comparison: ComparisonFunc::LessEqual,
            },
            blend: BlendConfig {
                enabled: false,
                write_mask: WRITE_MASK_ALL,
            },
            sampler: SamplerConfig {
                filter: config.sampler_filter,
                address: TextureAddress::Border,
                border_color: [0.0; 4],
                max_lod: config.sampler_filter.max_lod(),
            },
            vertices: &QUAD_VERTICES,
            vertex_stride: QuadVertex::STRIDE,
            layout: &QUAD_VERTEX_LAYOUT,
        }
    }
}
