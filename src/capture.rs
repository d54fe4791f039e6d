//! Prompt capture via the input-capture script subprocess.
//!
//! The child inherits stdin from the caller's terminal so the human can
//! answer the prompt directly; stdout and stderr are piped so the
//! orchestrator only sees the final echoed line once the child exits. This
//! split avoids parsing interleaved prompt/echo text out of a shared stream.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Cursor25xError, Result};

/// Trait for input capture implementations (real script or mock)
#[async_trait]
pub trait InputCapture: Send + Sync {
    /// Collect one line of user text
    async fn capture(&self, config: &Config) -> Result<String>;
}

/// Production implementation that spawns the input script
pub struct ScriptCapture;

#[async_trait]
impl InputCapture for ScriptCapture {
    async fn capture(&self, config: &Config) -> Result<String> {
        run_input_script(config).await
    }
}

/// Spawn the input script and wait for one line of output, bounded by the
/// configured capture timeout.
///
/// On exit 0 the captured stdout is returned trimmed of surrounding
/// whitespace. A non-zero exit fails with the captured stderr. When the
/// timeout fires first the child is killed fire-and-forget and the capture
/// fails with [`Cursor25xError::CaptureTimeout`].
pub async fn run_input_script(config: &Config) -> Result<String> {
    let script_path = config.input_script_path();
    if !script_path.exists() {
        return Err(Cursor25xError::ArtifactMissing(script_path));
    }

    debug!(
        "spawning input script: {} {}",
        config.interpreter,
        script_path.display()
    );

    let mut child = Command::new(&config.interpreter)
        .arg(&script_path)
        .current_dir(&config.working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(Cursor25xError::SpawnError)?;

    // Drain both pipes concurrently with the wait so a chatty child cannot
    // block on a full pipe buffer.
    let mut stdout_pipe = child.stdout.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(ref mut out) = stdout_pipe {
            let _ = out.read_to_end(&mut buf).await;
        }
        buf
    });

    let mut stderr_pipe = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(ref mut err) = stderr_pipe {
            let _ = err.read_to_end(&mut buf).await;
        }
        buf
    });

    let status = tokio::select! {
        status = child.wait() => status.map_err(Cursor25xError::ProcessIo)?,
        _ = tokio::time::sleep(config.capture_timeout) => {
            warn!(
                "no input within {:?}, terminating input script",
                config.capture_timeout
            );
            // Fire-and-forget: the failure is reported without waiting for
            // the child to be reaped.
            let _ = child.start_kill();
            stdout_task.abort();
            stderr_task.abort();
            return Err(Cursor25xError::CaptureTimeout(config.capture_timeout));
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    if status.success() {
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    } else {
        Err(Cursor25xError::CaptureProcess {
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        })
    }
}
