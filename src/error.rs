use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the cursor25x server
#[derive(Error, Debug)]
pub enum Cursor25xError {
    /// An artifact could not be written to disk
    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input script is missing from the working directory
    #[error("input script not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Failed to spawn the input script subprocess
    #[error("failed to spawn input script: {0}")]
    SpawnError(#[source] std::io::Error),

    /// Error communicating with the input script subprocess
    #[error("process I/O error: {0}")]
    ProcessIo(#[source] std::io::Error),

    /// The input script did not produce a line within the capture window
    #[error("user input timeout after {} seconds", .0.as_secs())]
    CaptureTimeout(Duration),

    /// The input script exited with a non-zero code
    #[error("input script exited with code {code:?}: {stderr}")]
    CaptureProcess {
        code: Option<i32>,
        stderr: String,
    },

    /// The captured text was blank after trimming
    #[error("empty input")]
    EmptyInput,
}

/// Result type alias for cursor25x operations
pub type Result<T> = std::result::Result<T, Cursor25xError>;
