use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bootstrap::{INPUT_SCRIPT_NAME, RULES_DOC_NAME};

/// Environment variable that overrides the working directory
pub const WORKSPACE_ENV: &str = "CURSOR_WORKSPACE";

fn default_capture_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_interpreter() -> String {
    "node".to_string()
}

/// Main configuration for the cursor25x server
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for all file operations
    pub working_dir: PathBuf,
    /// How long to wait for the input script to produce a line and exit
    pub capture_timeout: Duration,
    /// Executable used to run the input script
    pub interpreter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(resolve_working_dir())
    }
}

impl Config {
    /// Create a configuration rooted at the given directory, with defaults
    /// for everything else
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            capture_timeout: default_capture_timeout(),
            interpreter: default_interpreter(),
        }
    }

    /// Merge CLI arguments into this configuration.
    /// CLI arguments take precedence over environment-derived values.
    pub fn merge_cli_args(
        &mut self,
        workspace: Option<PathBuf>,
        timeout_secs: Option<u64>,
        interpreter: Option<String>,
    ) {
        if let Some(ws) = workspace {
            self.working_dir = ws;
        }
        if let Some(secs) = timeout_secs {
            self.capture_timeout = Duration::from_secs(secs);
        }
        if let Some(interp) = interpreter {
            self.interpreter = interp;
        }
    }

    /// Path of the input-capture script inside the working directory
    pub fn input_script_path(&self) -> PathBuf {
        self.working_dir.join(INPUT_SCRIPT_NAME)
    }

    /// Path of the rules document inside the working directory
    pub fn rules_doc_path(&self) -> PathBuf {
        self.working_dir
            .join(".cursor")
            .join("rules")
            .join(RULES_DOC_NAME)
    }
}

/// Resolve the working directory once at startup:
/// `CURSOR_WORKSPACE` override, then the current directory (unless it is
/// the filesystem root), then a fallback under the user's home.
pub fn resolve_working_dir() -> PathBuf {
    if let Ok(ws) = std::env::var(WORKSPACE_ENV) {
        if !ws.is_empty() {
            return PathBuf::from(ws);
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if cwd != Path::new("/") {
            return cwd;
        }
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cursor25x")
}
