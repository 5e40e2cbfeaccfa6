//! Per-frame work: pull at most one captured frame into the mirror texture
//! and draw the quad.

use tracing::{debug, trace};

use crate::capture::{FrameDesc, FrameSource, POLL_TIMEOUT_MS, PollOutcome};
use crate::config::MirrorConfig;
use crate::error::{MirrorError, MirrorResult};
use crate::gpu::{CopyRegion, GpuContext};
use crate::host_state::HostState;
use crate::pipeline::MIRROR_MIP_LEVELS;

struct MirrorTexture<M> {
    resource: M,
    desc: FrameDesc,
    bounds: CopyRegion,
}

/// Active-session state. Fields drop in declaration order, so the capture
/// source and mirror are released before the pipeline and device.
pub struct FrameCompositor<C, S>
where
    C: GpuContext,
    S: FrameSource<Frame = C::Frame>,
{
    source: S,
    mirror: Option<MirrorTexture<C::Mirror>>,
    context: C,
    apply_viewport: bool,
    resize_on_mismatch: bool,
}

impl<C, S> FrameCompositor<C, S>
where
    C: GpuContext,
    S: FrameSource<Frame = C::Frame>,
{
    pub fn new(context: C, source: S, config: &MirrorConfig) -> Self {
        Self {
            source,
            mirror: None,
            context,
            apply_viewport: config.apply_viewport,
            resize_on_mismatch: config.resize_on_mismatch,
        }
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn mirror_desc(&self) -> Option<FrameDesc> {
        self.mirror.as_ref().map(|mirror| mirror.desc)
    }

    pub fn render(&mut self, host: &HostState) -> MirrorResult<()> {
        self.context.bind_render_states();

        match self.source.poll_next_frame(POLL_TIMEOUT_MS)? {
            PollOutcome::Empty => trace!("no new desktop frame"),
            PollOutcome::Frame(frame, info) => {
                trace!(
                    accumulated = info.accumulated_frames,
                    present_qpc = info.last_present_qpc,
                    "desktop frame acquired"
                );
                let ingested = self.ingest(&frame, host);
                let released = self.source.release_frame(frame);
                ingested?;
                released?;
            }
        }

        self.context.write_transform(&host.transform())?;

        if self.apply_viewport {
            if let Some(viewport) = host.viewport() {
                self.context.apply_viewport(&viewport);
            }
        }

        self.context
            .draw_quad(self.mirror.as_ref().map(|mirror| &mirror.resource));
        Ok(())
    }

    fn ingest(&mut self, frame: &C::Frame, host: &HostState) -> MirrorResult<()> {
        let desc = self.context.describe_frame(frame);

        let recreate = match &self.mirror {
            None => true,
            Some(mirror) => self.resize_on_mismatch && !mirror.desc.same_geometry(&desc),
        };
        if recreate {
            if let Some(old) = self.mirror.take() {
                debug!(
                    old_width = old.desc.width,
                    old_height = old.desc.height,
                    width = desc.width,
                    height = desc.height,
                    "captured frame changed geometry; recreating mirror"
                );
            }
            let resource = self.context.create_mirror(frame, MIRROR_MIP_LEVELS)?;
            debug!(
                width = desc.width,
                height = desc.height,
                format = desc.format,
                mip_levels = MIRROR_MIP_LEVELS,
                "mirror texture created"
            );
            self.mirror = Some(MirrorTexture {
                resource,
                desc,
                bounds: CopyRegion::covering(&desc),
            });
        }

        let Some(mirror) = self.mirror.as_ref() else {
            return Err(MirrorError::MissingObject("CreateTexture2D"));
        };

        let region = mirror.bounds.clamped_to(&desc);
        if !region.is_empty() {
            self.context.copy_to_mirror(frame, &mirror.resource, region);
        }
        self.context.generate_mips(&mirror.resource);
        host.publish_captured_size(mirror.desc.width, mirror.desc.height);
        Ok(())
    }
}
