#![cfg_attr(
    all(has_precompiled_quad_vs, has_precompiled_quad_ps),
    allow(dead_code, unused_imports)
)]

use std::ffi::c_void;
use std::sync::OnceLock;

use tracing::debug;
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::Graphics::Direct3D::ID3DBlob;
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};
use windows::core::{HRESULT, Interface, PCSTR, s};

use crate::error::{MirrorError, MirrorResult};

// Bytecode embedded by build.rs when fxc.exe was available. Stages without a
// precompiled blob are compiled from `quad.hlsl` on first use.

#[cfg(any(not(has_precompiled_quad_vs), not(has_precompiled_quad_ps)))]
const HLSL_SOURCE: &str = include_str!("quad.hlsl");

#[cfg(has_precompiled_quad_vs)]
const PRECOMPILED_VS: &[u8] = include_bytes!(env!("QUAD_VS_CSO_PATH"));

#[cfg(has_precompiled_quad_ps)]
const PRECOMPILED_PS: &[u8] = include_bytes!(env!("QUAD_PS_CSO_PATH"));

/// Runtime compilers tried in order, newest first.
const COMPILER_LIBRARIES: [PCSTR; 3] = [
    s!("D3DCompiler_47.dll"),
    s!("D3DCompiler_46.dll"),
    s!("D3DCompiler_43.dll"),
];

pub(crate) fn vertex_bytecode() -> MirrorResult<&'static [u8]> {
    static BYTECODE: OnceLock<Result<Vec<u8>, String>> = OnceLock::new();
    cached(BYTECODE.get_or_init(|| {
        #[cfg(has_precompiled_quad_vs)]
        {
            Ok(PRECOMPILED_VS.to_vec())
        }
        #[cfg(not(has_precompiled_quad_vs))]
        {
            compile_runtime(s!("vs_main"), s!("vs_4_0"))
        }
    }))
}

pub(crate) fn pixel_bytecode() -> MirrorResult<&'static [u8]> {
    static BYTECODE: OnceLock<Result<Vec<u8>, String>> = OnceLock::new();
    cached(BYTECODE.get_or_init(|| {
        #[cfg(has_precompiled_quad_ps)]
        {
            Ok(PRECOMPILED_PS.to_vec())
        }
        #[cfg(not(has_precompiled_quad_ps))]
        {
            compile_runtime(s!("ps_main"), s!("ps_4_0"))
        }
    }))
}

fn cached(result: &'static Result<Vec<u8>, String>) -> MirrorResult<&'static [u8]> {
    result
        .as_ref()
        .map(Vec::as_slice)
        .map_err(|message| MirrorError::ShaderUnavailable(message.clone()))
}

type D3DCompileFn = unsafe extern "system" fn(
    src_data: *const c_void,
    src_data_size: usize,
    source_name: PCSTR,
    defines: *const c_void,
    include: *const c_void,
    entry_point: PCSTR,
    target: PCSTR,
    flags1: u32,
    flags2: u32,
    code: *mut *mut c_void,
    error_msgs: *mut *mut c_void,
) -> HRESULT;

/// A dynamically loaded `D3DCompile`, unloaded on drop.
struct RuntimeCompiler {
    module: HMODULE,
    compile: D3DCompileFn,
}

impl RuntimeCompiler {
    fn load() -> Result<Self, String> {
        for library in COMPILER_LIBRARIES {
            let Ok(module) = (unsafe { LoadLibraryA(library) }) else {
                continue;
            };
            match unsafe { GetProcAddress(module, s!("D3DCompile")) } {
                Some(proc) => {
                    let name = unsafe { library.to_string() }.unwrap_or_default();
                    debug!(library = %name, "loaded runtime shader compiler");
                    let compile = unsafe { std::mem::transmute::<_, D3DCompileFn>(proc) };
                    return Ok(Self { module, compile });
                }
                None => {
                    let _ = unsafe { FreeLibrary(module) };
                }
            }
        }
        Err("no D3DCompiler library exporting D3DCompile could be loaded".to_string())
    }

    fn compile(&self, source: &str, entry_point: PCSTR, target: PCSTR) -> Result<Vec<u8>, String> {
        let mut code: *mut c_void = std::ptr::null_mut();
        let mut errors: *mut c_void = std::ptr::null_mut();
        let hr = unsafe {
            (self.compile)(
                source.as_ptr().cast(),
                source.len(),
                PCSTR::null(),
                std::ptr::null(),
                std::ptr::null(),
                entry_point,
                target,
                0,
                0,
                &mut code,
                &mut errors,
            )
        };

        let code = (!code.is_null()).then(|| unsafe { ID3DBlob::from_raw(code) });
        let errors = (!errors.is_null()).then(|| unsafe { ID3DBlob::from_raw(errors) });

        if hr.is_err() {
            let diagnostic = errors.as_ref().map(blob_bytes).map_or_else(String::new, |bytes| {
                String::from_utf8_lossy(&bytes).trim_end_matches('\0').trim().to_string()
            });
            let entry = unsafe { entry_point.to_string() }.unwrap_or_default();
            return Err(format!(
                "D3DCompile({entry}) failed with 0x{:08x}: {diagnostic}",
                hr.0 as u32
            ));
        }

        code.as_ref()
            .map(blob_bytes)
            .ok_or_else(|| "D3DCompile returned no bytecode".to_string())
    }
}

impl Drop for RuntimeCompiler {
    fn drop(&mut self) {
        let _ = unsafe { FreeLibrary(self.module) };
    }
}

fn blob_bytes(blob: &ID3DBlob) -> Vec<u8> {
    let ptr = unsafe { blob.GetBufferPointer() } as *const u8;
    let len = unsafe { blob.GetBufferSize() };
    unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec()
}

#[cfg(any(not(has_precompiled_quad_vs), not(has_precompiled_quad_ps)))]
fn compile_runtime(entry_point: PCSTR, target: PCSTR) -> Result<Vec<u8>, String> {
    let compiler = RuntimeCompiler::load()?;
    compiler.compile(HLSL_SOURCE, entry_point, target)
}
