//! Diagnostic output. A plugin has no console of its own, so on Windows
//! everything goes to the debugger output stream.

use std::io;
use std::sync::OnceLock;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::env_config;

pub const ENV_LOG: &str = "SNOW_MIRROR_LOG";
const DEFAULT_DIRECTIVE: &str = "snow_mirror=info";

/// Installs the global subscriber once. Later calls, or a subscriber the
/// host already installed, leave the existing one in place.
pub fn init() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let directive = env_config::env_var(ENV_LOG).unwrap_or_else(|| DEFAULT_DIRECTIVE.into());
        let filter =
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(DebugOutput),
            )
            .try_init();
    });
}

/// Writes one message straight to the debug-output sink, bypassing any
/// subscriber filter.
pub fn write_debug_output(message: &str) {
    #[cfg(target_os = "windows")]
    {
        use windows::Win32::System::Diagnostics::Debug::OutputDebugStringA;
        use windows::core::PCSTR;

        let mut bytes: Vec<u8> = message.bytes().filter(|&b| b != 0).collect();
        bytes.push(0);
        unsafe { OutputDebugStringA(PCSTR::from_raw(bytes.as_ptr())) };
    }
    #[cfg(not(target_os = "windows"))]
    {
        use std::io::Write;
        let _ = io::stderr().write_all(message.as_bytes());
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DebugOutput;

impl<'a> MakeWriter<'a> for DebugOutput {
    type Writer = DebugOutputWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DebugOutputWriter::default()
    }
}

/// Buffers one formatted event and emits it as a single debug string.
#[derive(Debug, Default)]
pub struct DebugOutputWriter {
    buffer: Vec<u8>,
}

impl DebugOutputWriter {
    fn take_message(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl io::Write for DebugOutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(message) = self.take_message() {
            write_debug_output(&message);
        }
        Ok(())
    }
}

impl Drop for DebugOutputWriter {
    fn drop(&mut self) {
        if let Some(message) = self.take_message() {
            write_debug_output(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn writer_buffers_until_flushed() -> io::Result<()> {
        let mut writer = DebugOutput.make_writer();
        writer.write_all(b"mirror ")?;
        writer.write_all(b"ready\n")?;
        assert_eq!(writer.buffer, b"mirror ready\n");
        writer.flush()?;
        assert!(writer.buffer.is_empty());
        Ok(())
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::info!("logging installed");
    }
}
