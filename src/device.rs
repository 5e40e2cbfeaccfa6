//! Device lifecycle: reacts to the host's graphics-device events and owns the
//! active session between initialize and shutdown.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::compositor::FrameCompositor;
use crate::config::MirrorConfig;
use crate::error::{MirrorError, MirrorResult};
use crate::gpu::{GraphicsPlatform, RawDevice};
use crate::host_state::HostState;
use crate::pipeline::PipelineDesc;

/// Renderer kinds as numbered by the host engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererKind {
    OpenGl,
    Direct3D9,
    Direct3D11,
    Gcm,
    Null,
    Hollywood,
    Xenon,
    OpenGlEsObsolete,
    OpenGlEs20Mobile,
    Molehill,
    OpenGlEs20Desktop,
    OpenGlEs30,
    Unknown(i32),
}

impl RendererKind {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::OpenGl,
            1 => Self::Direct3D9,
            2 => Self::Direct3D11,
            3 => Self::Gcm,
            4 => Self::Null,
            5 => Self::Hollywood,
            6 => Self::Xenon,
            7 => Self::OpenGlEsObsolete,
            8 => Self::OpenGlEs20Mobile,
            9 => Self::Molehill,
            10 => Self::OpenGlEs20Desktop,
            11 => Self::OpenGlEs30,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEventKind {
    Initialize,
    Shutdown,
    BeforeReset,
    AfterReset,
    Unknown(i32),
}

impl DeviceEventKind {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Initialize,
            1 => Self::Shutdown,
            2 => Self::BeforeReset,
            3 => Self::AfterReset,
            other => Self::Unknown(other),
        }
    }
}

enum ConfigSource {
    Environment,
    Fixed(MirrorConfig),
}

impl ConfigSource {
    fn resolve(&self) -> MirrorConfig {
        match self {
            Self::Environment => MirrorConfig::from_env(),
            Self::Fixed(config) => *config,
        }
    }
}

type Session<P> = FrameCompositor<
    <P as GraphicsPlatform>::Context,
    <P as GraphicsPlatform>::Source,
>;

pub struct DeviceManager<P: GraphicsPlatform> {
    platform: P,
    host: Arc<HostState>,
    config: ConfigSource,
    session: Option<Session<P>>,
}

impl<P: GraphicsPlatform> DeviceManager<P> {
    /// A manager that re-reads [`MirrorConfig`] from the environment on every
    /// initialize.
    pub fn new(platform: P, host: Arc<HostState>) -> Self {
        Self {
            platform,
            host,
            config: ConfigSource::Environment,
            session: None,
        }
    }

    pub fn with_config(platform: P, host: Arc<HostState>, config: MirrorConfig) -> Self {
        Self {
            platform,
            host,
            config: ConfigSource::Fixed(config),
            session: None,
        }
    }

    pub fn host(&self) -> &Arc<HostState> {
        &self.host
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session<P>> {
        self.session.as_ref()
    }

    pub fn on_device_event(
        &mut self,
        device: RawDevice,
        renderer: RendererKind,
        event: DeviceEventKind,
    ) -> MirrorResult<()> {
        if renderer != self.platform.renderer() {
            debug!(?renderer, ?event, "ignoring device event for foreign renderer");
            return Ok(());
        }

        match event {
            DeviceEventKind::Initialize => self.initialize(device),
            DeviceEventKind::Shutdown => {
                self.shutdown();
                Ok(())
            }
            DeviceEventKind::BeforeReset
            | DeviceEventKind::AfterReset
            | DeviceEventKind::Unknown(_) => {
                trace!(?event, "device event ignored");
                Ok(())
            }
        }
    }

    pub fn on_render_event(&mut self) -> MirrorResult<()> {
        match self.session.as_mut() {
            Some(session) => session.render(&self.host),
            None => Ok(()),
        }
    }

    fn initialize(&mut self, device: RawDevice) -> MirrorResult<()> {
        if self.session.is_some() {
            debug!("device re-initialized while active; tearing down previous session");
            self.shutdown();
        }
        if device.is_null() {
            return Err(MirrorError::Platform(anyhow::anyhow!(
                "host passed a null graphics device"
            )));
        }

        let config = self.config.resolve();
        let desc = PipelineDesc::from_config(&config);
        let context = self.platform.create_context(device, &desc)?;
        let source = self.platform.open_source(&context)?;
        self.session = Some(FrameCompositor::new(context, source, &config));

        info!(
            cull = ?config.cull_mode,
            sampler = ?config.sampler_filter,
            apply_viewport = config.apply_viewport,
            resize_on_mismatch = config.resize_on_mismatch,
            "mirror session initialized"
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        let was_active = self.session.take().is_some();
        self.host.reset_captured_size();
        if was_active {
            info!("mirror session shut down");
        }
    }
}
