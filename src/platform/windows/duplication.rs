use tracing::{debug, trace};
use windows::Win32::Graphics::Direct3D11::{ID3D11Device, ID3D11Texture2D};
use windows::Win32::Graphics::Dxgi::{
    DXGI_ERROR_WAIT_TIMEOUT, DXGI_OUTDUPL_FRAME_INFO, IDXGIAdapter, IDXGIDevice, IDXGIOutput1,
    IDXGIOutputDuplication, IDXGIResource,
};
use windows::core::Interface;

use crate::capture::{FrameInfo, FrameSource, PollOutcome};
use crate::error::{MirrorError, MirrorResult};

use super::d3d11::CheckHresult;

/// Desktop duplication of output 0 on the adapter that owns the host device.
pub(crate) struct OutputDuplicationSource {
    duplication: IDXGIOutputDuplication,
}

unsafe impl Send for OutputDuplicationSource {}

impl OutputDuplicationSource {
    pub(crate) fn open(device: &ID3D11Device) -> MirrorResult<Self> {
        let dxgi_device: IDXGIDevice = device.cast().check("GetDXGIDevice")?;
        let adapter: IDXGIAdapter = unsafe { dxgi_device.GetParent() }.check("GetDXGIAdapter")?;
        let output = unsafe { adapter.EnumOutputs(0) }.check("GetDXGIOutput")?;
        let output1: IDXGIOutput1 = output.cast().check("GetDXGIOutput1")?;
        let duplication = unsafe { output1.DuplicateOutput(device) }.check("DuplicateOutput")?;
        debug!("desktop duplication opened on output 0");
        Ok(Self { duplication })
    }

    fn release_acquired(&self) -> MirrorResult<()> {
        unsafe { self.duplication.ReleaseFrame() }.check("ReleaseFrame")
    }
}

impl FrameSource for OutputDuplicationSource {
    type Frame = ID3D11Texture2D;

    fn poll_next_frame(&mut self, timeout_ms: u32) -> MirrorResult<PollOutcome<ID3D11Texture2D>> {
        let mut info = DXGI_OUTDUPL_FRAME_INFO::default();
        let mut resource: Option<IDXGIResource> = None;
        let acquired =
            unsafe { self.duplication.AcquireNextFrame(timeout_ms, &mut info, &mut resource) };
        if let Err(error) = acquired {
            if error.code() == DXGI_ERROR_WAIT_TIMEOUT {
                return Ok(PollOutcome::Empty);
            }
            return Err(MirrorError::from_windows("AcquireNextFrame", error));
        }

        let Some(resource) = resource else {
            self.release_acquired()?;
            return Err(MirrorError::MissingObject("AcquireNextFrame"));
        };
        let texture: ID3D11Texture2D = match resource.cast() {
            Ok(texture) => texture,
            Err(error) => {
                self.release_acquired()?;
                return Err(MirrorError::from_windows("QueryDesktopTexture", error));
            }
        };

        trace!(
            accumulated = info.AccumulatedFrames,
            present_qpc = info.LastPresentTime,
            "duplication frame acquired"
        );
        Ok(PollOutcome::Frame(
            texture,
            FrameInfo {
                accumulated_frames: info.AccumulatedFrames,
                last_present_qpc: info.LastPresentTime,
            },
        ))
    }

    fn release_frame(&mut self, frame: ID3D11Texture2D) -> MirrorResult<()> {
        drop(frame);
        self.release_acquired()
    }
}
