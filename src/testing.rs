//! Recording mock of the platform traits for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::capture::{FrameDesc, FrameInfo, FrameSource, PollOutcome};
use crate::device::RendererKind;
use crate::error::{MirrorError, MirrorResult};
use crate::geometry::{TransformMatrix, ViewportRect};
use crate::gpu::{CopyRegion, GpuContext, GraphicsPlatform, RawDevice};
use crate::pipeline::{CullMode, PipelineDesc};

pub(crate) const BGRA8: u32 = 87;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum GpuCall {
    CreateContext { cull_mode: CullMode },
    OpenSource,
    BindRenderStates,
    Poll,
    ReleaseFrame { frame: u32 },
    CreateMirror { id: u32, desc: FrameDesc, mip_levels: u32 },
    CopyToMirror { frame: u32, mirror: u32, region: CopyRegion },
    GenerateMips { mirror: u32 },
    WriteTransform(TransformMatrix),
    ApplyViewport(ViewportRect),
    Draw { mirror: Option<u32> },
    DropMirror { id: u32 },
    DropSource,
    DropContext,
}

#[derive(Clone, Debug)]
pub(crate) enum ScriptedPoll {
    Frame(FrameDesc),
    Empty,
    Fail(i32),
}

pub(crate) fn frame(width: u32, height: u32) -> ScriptedPoll {
    ScriptedPoll::Frame(FrameDesc {
        width,
        height,
        format: BGRA8,
    })
}

#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<GpuCall>>>);

impl CallLog {
    fn push(&self, call: GpuCall) {
        self.0.lock().expect("call log poisoned").push(call);
    }

    pub(crate) fn calls(&self) -> Vec<GpuCall> {
        self.0.lock().expect("call log poisoned").clone()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().expect("call log poisoned").clear();
    }

    pub(crate) fn count(&self, predicate: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockFailures {
    pub(crate) create_context: bool,
    pub(crate) open_source: bool,
    pub(crate) create_mirror: bool,
}

#[derive(Clone)]
pub(crate) struct MockPlatform {
    pub(crate) log: CallLog,
    script: Arc<Mutex<VecDeque<ScriptedPoll>>>,
    pub(crate) failures: MockFailures,
}

impl MockPlatform {
    pub(crate) fn new() -> Self {
        Self {
            log: CallLog::default(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            failures: MockFailures::default(),
        }
    }

    pub(crate) fn with_failures(failures: MockFailures) -> Self {
        Self {
            failures,
            ..Self::new()
        }
    }

    /// Queues poll results. Once the queue drains every poll is empty.
    pub(crate) fn script(&self, polls: impl IntoIterator<Item = ScriptedPoll>) {
        self.script
            .lock()
            .expect("poll script poisoned")
            .extend(polls);
    }

    pub(crate) fn device() -> RawDevice {
        RawDevice::new(std::ptr::NonNull::<u8>::dangling().as_ptr().cast())
    }
}

pub(crate) struct MockFrame {
    id: u32,
    desc: FrameDesc,
}

pub(crate) struct MockMirror {
    id: u32,
    log: CallLog,
}

impl Drop for MockMirror {
    fn drop(&mut self) {
        self.log.push(GpuCall::DropMirror { id: self.id });
    }
}

pub(crate) struct MockContext {
    log: CallLog,
    fail_create_mirror: bool,
    next_mirror: u32,
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.log.push(GpuCall::DropContext);
    }
}

impl GpuContext for MockContext {
    type Frame = MockFrame;
    type Mirror = MockMirror;

    fn bind_render_states(&mut self) {
        self.log.push(GpuCall::BindRenderStates);
    }

    fn describe_frame(&self, frame: &MockFrame) -> FrameDesc {
        frame.desc
    }

    fn create_mirror(&mut self, frame: &MockFrame, mip_levels: u32) -> MirrorResult<MockMirror> {
        if self.fail_create_mirror {
            return Err(MirrorError::Hresult {
                operation: "CreateTexture2D",
                code: 0x8007_000E_u32 as i32,
            });
        }
        self.next_mirror += 1;
        self.log.push(GpuCall::CreateMirror {
            id: self.next_mirror,
            desc: frame.desc,
            mip_levels,
        });
        Ok(MockMirror {
            id: self.next_mirror,
            log: self.log.clone(),
        })
    }

    fn copy_to_mirror(&mut self, frame: &MockFrame, mirror: &MockMirror, region: CopyRegion) {
        self.log.push(GpuCall::CopyToMirror {
            frame: frame.id,
            mirror: mirror.id,
            region,
        });
    }

    fn generate_mips(&mut self, mirror: &MockMirror) {
        self.log.push(GpuCall::GenerateMips { mirror: mirror.id });
    }

    fn write_transform(&mut self, transform: &TransformMatrix) -> MirrorResult<()> {
        self.log.push(GpuCall::WriteTransform(*transform));
        Ok(())
    }

    fn apply_viewport(&mut self, viewport: &ViewportRect) {
        self.log.push(GpuCall::ApplyViewport(*viewport));
    }

    fn draw_quad(&mut self, mirror: Option<&MockMirror>) {
        self.log.push(GpuCall::Draw {
            mirror: mirror.map(|m| m.id),
        });
    }
}

pub(crate) struct MockSource {
    log: CallLog,
    script: Arc<Mutex<VecDeque<ScriptedPoll>>>,
    next_frame: u32,
}

impl Drop for MockSource {
    fn drop(&mut self) {
        self.log.push(GpuCall::DropSource);
    }
}

impl FrameSource for MockSource {
    type Frame = MockFrame;

    fn poll_next_frame(&mut self, timeout_ms: u32) -> MirrorResult<PollOutcome<MockFrame>> {
        assert_eq!(timeout_ms, 0, "render polls must not wait");
        self.log.push(GpuCall::Poll);
        let next = self.script.lock().expect("poll script poisoned").pop_front();
        match next.unwrap_or(ScriptedPoll::Empty) {
            ScriptedPoll::Empty => Ok(PollOutcome::Empty),
            ScriptedPoll::Fail(code) => Err(MirrorError::Hresult {
                operation: "AcquireNextFrame",
                code,
            }),
            ScriptedPoll::Frame(desc) => {
                self.next_frame += 1;
                Ok(PollOutcome::Frame(
                    MockFrame {
                        id: self.next_frame,
                        desc,
                    },
                    FrameInfo {
                        accumulated_frames: 1,
                        last_present_qpc: i64::from(self.next_frame),
                    },
                ))
            }
        }
    }

    fn release_frame(&mut self, frame: MockFrame) -> MirrorResult<()> {
        self.log.push(GpuCall::ReleaseFrame { frame: frame.id });
        Ok(())
    }
}

impl GraphicsPlatform for MockPlatform {
    type Context = MockContext;
    type Source = MockSource;

    fn renderer(&self) -> RendererKind {
        RendererKind::Direct3D11
    }

    fn create_context(&self, device: RawDevice, desc: &PipelineDesc) -> MirrorResult<MockContext> {
        assert!(!device.is_null());
        if self.failures.create_context {
            return Err(MirrorError::Hresult {
                operation: "CreateRasterizerState",
                code: 0x8007_0057_u32 as i32,
            });
        }
        self.log.push(GpuCall::CreateContext {
            cull_mode: desc.rasterizer.cull_mode,
        });
        Ok(MockContext {
            log: self.log.clone(),
            fail_create_mirror: self.failures.create_mirror,
            next_mirror: 0,
        })
    }

    fn open_source(&self, _context: &MockContext) -> MirrorResult<MockSource> {
        if self.failures.open_source {
            return Err(MirrorError::Hresult {
                operation: "DuplicateOutput",
                code: 0x887A_0004_u32 as i32,
            });
        }
        self.log.push(GpuCall::OpenSource);
        Ok(MockSource {
            log: self.log.clone(),
            script: Arc::clone(&self.script),
            next_frame: 0,
        })
    }
}
