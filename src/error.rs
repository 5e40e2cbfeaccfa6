use std::fmt;

use tracing::warn;

#[derive(Debug)]
pub enum MirrorError {
    /// A platform call returned a failing status code.
    Hresult {
        operation: &'static str,
        code: i32,
    },

    /// A create call reported success but handed back no object.
    MissingObject(&'static str),

    /// Neither precompiled bytecode nor a runtime shader compiler could
    /// produce the quad program. Rendering continues without shaders.
    ShaderUnavailable(String),

    Unsupported(String),

    Platform(anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorErrorClass {
    /// Rendering degrades (stale or blank quad) but the session carries on.
    Tolerated,
    /// The graphics environment cannot be repaired from inside the plugin.
    Fatal,
}

impl MirrorError {
    pub fn class(&self) -> MirrorErrorClass {
        match self {
            Self::ShaderUnavailable(_) => MirrorErrorClass::Tolerated,
            Self::Hresult { .. }
            | Self::MissingObject(_)
            | Self::Unsupported(_)
            | Self::Platform(_) => MirrorErrorClass::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.class(), MirrorErrorClass::Fatal)
    }

    /// Name of the failing platform operation, when the error carries one.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Hresult { operation, .. } | Self::MissingObject(operation) => Some(operation),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<i32> {
        match self {
            Self::Hresult { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[cfg(target_os = "windows")]
    pub(crate) fn from_windows(operation: &'static str, error: windows::core::Error) -> Self {
        Self::Hresult {
            operation,
            code: error.code().0,
        }
    }
}

/// Formats a status code the way the debug log reports it: zero-padded
/// hex followed by the signed decimal value, e.g. `0x887a0026(-2005270490)`.
pub fn format_status(code: i32) -> String {
    format!("0x{:08x}({code})", code as u32)
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hresult { operation, code } => {
                write!(f, "{operation} failed with {}", format_status(*code))
            }
            Self::MissingObject(operation) => {
                write!(f, "{operation} succeeded but returned no object")
            }
            Self::ShaderUnavailable(message) => write!(f, "quad shader unavailable: {message}"),
            Self::Unsupported(message) => write!(f, "unsupported graphics environment: {message}"),
            Self::Platform(inner) => write!(f, "{inner:#}"),
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Platform(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Turns a tolerated error into `Ok(None)` after logging it under `stage`.
/// Fatal errors pass through unchanged.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn tolerate<T>(
    stage: &'static str,
    result: MirrorResult<T>,
) -> MirrorResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if !err.is_fatal() => {
            warn!(stage, "{err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
