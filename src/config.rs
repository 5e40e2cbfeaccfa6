use crate::env_config;
use crate::pipeline::{CullMode, SamplerFilter};

pub const ENV_CULL: &str = "SNOW_MIRROR_CULL";
pub const ENV_VIEWPORT: &str = "SNOW_MIRROR_VIEWPORT";
pub const ENV_SAMPLER: &str = "SNOW_MIRROR_SAMPLER";
pub const ENV_RESIZE_ON_MISMATCH: &str = "SNOW_MIRROR_RESIZE_ON_MISMATCH";

/// Per-session configuration, read once when the device initializes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Rasterizer cull mode for the quad.
    pub cull_mode: CullMode,
    /// Apply the host-supplied viewport before drawing. When `false` the
    /// host's currently bound viewport is left untouched.
    pub apply_viewport: bool,
    pub sampler_filter: SamplerFilter,
    /// Recreate the mirror texture when a captured frame no longer matches
    /// its size or format. Off by default: the mirror keeps the geometry of
    /// the first captured frame for the whole session.
    pub resize_on_mismatch: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            apply_viewport: true,
            sampler_filter: SamplerFilter::Point,
            resize_on_mismatch: false,
        }
    }
}

impl MirrorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_config::env_var)
    }

    /// Builds a config from an arbitrary variable lookup. Unknown values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let cull_mode = lookup(ENV_CULL)
            .and_then(|raw| CullMode::parse(&raw))
            .unwrap_or(defaults.cull_mode);
        let apply_viewport = lookup(ENV_VIEWPORT)
            .map(|raw| !env_config::is_falsy(&raw))
            .unwrap_or(defaults.apply_viewport);
        let sampler_filter = lookup(ENV_SAMPLER)
            .and_then(|raw| SamplerFilter::parse(&raw))
            .unwrap_or(defaults.sampler_filter);
        let resize_on_mismatch = lookup(ENV_RESIZE_ON_MISMATCH)
            .map(|raw| env_config::is_truthy(&raw))
            .unwrap_or(defaults.resize_on_mismatch);

        Self {
            cull_mode,
            apply_viewport,
            sampler_filter,
            resize_on_mismatch,
        }
    }
}
