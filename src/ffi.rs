//! C ABI entry points called by the host engine.
//!
//! Device and render hooks arrive on the host render thread. The setters and
//! size getters may arrive from any thread and never touch the device lock.

#![allow(non_snake_case)]

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{error, info, trace, warn};

use crate::device::{DeviceEventKind, DeviceManager, RendererKind};
use crate::error::{MirrorError, MirrorResult};
use crate::geometry::{TransformMatrix, ViewportRect};
use crate::gpu::RawDevice;
use crate::host_state::HostState;
use crate::logging;
use crate::platform::NativePlatform;

fn host_state() -> &'static Arc<HostState> {
    static HOST: OnceLock<Arc<HostState>> = OnceLock::new();
    HOST.get_or_init(|| Arc::new(HostState::new()))
}

fn manager() -> &'static Mutex<DeviceManager<NativePlatform>> {
    static MANAGER: OnceLock<Mutex<DeviceManager<NativePlatform>>> = OnceLock::new();
    MANAGER.get_or_init(|| {
        Mutex::new(DeviceManager::new(
            NativePlatform::default(),
            Arc::clone(host_state()),
        ))
    })
}

/// Runs a hook body, terminating the process on any fatal error or panic.
fn run_hook(hook: &'static str, body: impl FnOnce() -> MirrorResult<()>) {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) if !err.is_fatal() => warn!(hook, "{err}"),
        Ok(Err(err)) => fatal(hook, &err),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            fatal(
                hook,
                &MirrorError::Platform(anyhow::anyhow!("panic in {hook}: {message}")),
            );
        }
    }
}

fn fatal(hook: &'static str, err: &MirrorError) -> ! {
    let message = err.to_string();
    logging::write_debug_output(&format!("{message}\n"));
    error!(hook, "{message}");
    std::process::exit(1);
}

fn with_manager(
    body: impl FnOnce(&mut DeviceManager<NativePlatform>) -> MirrorResult<()>,
) -> MirrorResult<()> {
    let mut guard = manager().lock().unwrap_or_else(PoisonError::into_inner);
    body(&mut guard)
}

#[unsafe(no_mangle)]
pub extern "C" fn UnitySetGraphicsDevice(
    device: *mut c_void,
    device_type: i32,
    event_type: i32,
) {
    logging::init();
    let renderer = RendererKind::from_raw(device_type);
    let event = DeviceEventKind::from_raw(event_type);
    run_hook("UnitySetGraphicsDevice", || {
        with_manager(|manager| manager.on_device_event(RawDevice::new(device), renderer, event))
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn UnityRenderEvent(event_id: i32) {
    trace!(event_id, "render event");
    run_hook("UnityRenderEvent", || with_manager(DeviceManager::on_render_event));
}

/// # Safety
///
/// `matrix` must be null or point to 16 readable `f32` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn SetRenderMatrix(matrix: *const f32) {
    if matrix.is_null() {
        return;
    }
    let values = unsafe { std::slice::from_raw_parts(matrix, 16) };
    if let Some(transform) = TransformMatrix::from_slice(values) {
        host_state().set_transform(transform);
    }
}

/// # Safety
///
/// `rect` must be null or point to 4 readable `f32` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn SetViewport(rect: *const f32) {
    if rect.is_null() {
        return;
    }
    let values = unsafe { std::slice::from_raw_parts(rect, 4) };
    if let Some(viewport) = ViewportRect::from_slice(values) {
        host_state().set_viewport(viewport);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn GetScreenWidth() -> u32 {
    host_state().captured_width()
}

#[unsafe(no_mangle)]
pub extern "C" fn GetScreenHeight() -> u32 {
    host_state().captured_height()
}

/// Load-time handshake from the host script.
#[unsafe(no_mangle)]
pub extern "C" fn SayHello() {
    logging::init();
    info!(version = env!("CARGO_PKG_VERSION"), "snow-mirror plugin loaded");
}
