use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One entry point of `quad.hlsl` that build time tries to precompile.
struct Stage {
    entry_point: &'static str,
    profile: &'static str,
    cso_name: &'static str,
    env_var: &'static str,
    cfg: &'static str,
}

const HLSL_PATH: &str = "src/platform/windows/quad.hlsl";

const STAGES: [Stage; 2] = [
    Stage {
        entry_point: "vs_main",
        profile: "vs_4_0",
        cso_name: "quad_vs.cso",
        env_var: "QUAD_VS_CSO_PATH",
        cfg: "has_precompiled_quad_vs",
    },
    Stage {
        entry_point: "ps_main",
        profile: "ps_4_0",
        cso_name: "quad_ps.cso",
        env_var: "QUAD_PS_CSO_PATH",
        cfg: "has_precompiled_quad_ps",
    },
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={HLSL_PATH}");
    println!("cargo:rerun-if-env-changed=SNOW_MIRROR_FXC_PATH");
    println!("cargo:rerun-if-env-changed=SNOW_MIRROR_PRECOMPILE_SHADER");
    for stage in &STAGES {
        println!("cargo:rustc-check-cfg=cfg({})", stage.cfg);
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };

    // SNOW_MIRROR_PRECOMPILE_SHADER=0 leaves both stages to the runtime compiler.
    let disabled = env::var("SNOW_MIRROR_PRECOMPILE_SHADER").is_ok_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        )
    });
    if disabled {
        println!("cargo:warning=quad shader precompilation disabled; compiling at runtime");
        return;
    }

    let Some(fxc) = locate_fxc() else {
        println!(
            "cargo:warning=fxc.exe not found (set SNOW_MIRROR_FXC_PATH); quad shader compiles at runtime"
        );
        return;
    };

    let hlsl = Path::new(HLSL_PATH);
    for stage in &STAGES {
        let cso = out_dir.join(stage.cso_name);
        match compile_stage(&fxc, hlsl, &cso, stage) {
            Ok(()) => {
                println!("cargo:rustc-env={}={}", stage.env_var, cso.display());
                println!("cargo:rustc-cfg={}", stage.cfg);
            }
            Err(detail) => println!(
                "cargo:warning=fxc failed on {} ({detail}); compiling at runtime",
                stage.entry_point
            ),
        }
    }
}

/// First usable fxc: an explicit override, the SDK bin directory a developer
/// prompt exports, then whatever `PATH` resolves.
fn locate_fxc() -> Option<PathBuf> {
    let explicit = env::var("SNOW_MIRROR_FXC_PATH")
        .ok()
        .map(|path| PathBuf::from(path.trim()))
        .filter(|path| path.is_file());
    let sdk_bin = env::var("WindowsSdkVerBinPath")
        .ok()
        .map(|bin| PathBuf::from(bin).join("x64").join("fxc.exe"))
        .filter(|path| path.is_file());
    let on_path = Command::new("fxc.exe")
        .arg("/?")
        .output()
        .is_ok()
        .then(|| PathBuf::from("fxc.exe"));

    explicit.or(sdk_bin).or(on_path)
}

fn compile_stage(fxc: &Path, hlsl: &Path, cso: &Path, stage: &Stage) -> Result<(), String> {
    let output = Command::new(fxc)
        .args(["/nologo", "/O3", "/T", stage.profile, "/E", stage.entry_point, "/Fo"])
        .arg(cso)
        .arg(hlsl)
        .output()
        .map_err(|err| format!("{}: {err}", fxc.display()))?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let first_line = stderr.lines().find(|line| !line.trim().is_empty());
    Err(match (output.status.code(), first_line) {
        (Some(code), Some(line)) => format!("exit {code}: {}", line.trim()),
        (Some(code), None) => format!("exit {code}"),
        (None, _) => "terminated".to_string(),
    })
}
