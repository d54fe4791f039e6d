//! Single-iteration orchestration of the interactive task loop.
//!
//! One invocation performs exactly one iteration: bootstrap the artifacts if
//! this is the first call, capture one line of user input, classify it, and
//! return an [`IterationResult`]. Continuation across iterations is the
//! caller's responsibility.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::bootstrap::{ensure_artifact, INPUT_SCRIPT, RULES_DOC};
use crate::capture::InputCapture;
use crate::classify::classify;
use crate::config::Config;
use crate::error::{Cursor25xError, Result};

/// Result of a single loop iteration. Transient: returned to the caller and
/// discarded, never persisted.
#[derive(Debug, Clone)]
pub struct IterationResult {
    /// Whether the iteration completed with classified input
    pub success: bool,
    /// Task message on success, failure summary otherwise
    pub message: String,
    /// The raw captured input, when any was received
    pub user_input: Option<String>,
    /// Description of the failure, when there was one
    pub error: Option<String>,
}

impl IterationResult {
    fn success(message: String, user_input: String) -> Self {
        Self {
            success: true,
            message,
            user_input: Some(user_input),
            error: None,
        }
    }

    fn failure(message: &str, error: String) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            user_input: None,
            error: Some(error),
        }
    }
}

/// Orchestrator for the interactive task loop
pub struct TaskLoop<C: InputCapture> {
    config: Config,
    capture: C,
    /// Set once the first iteration has scaffolded both artifacts
    bootstrapped: AtomicBool,
}

impl<C: InputCapture> TaskLoop<C> {
    /// Create a new TaskLoop with the given configuration and capture
    /// implementation
    pub fn new(config: Config, capture: C) -> Self {
        Self {
            config,
            capture,
            bootstrapped: AtomicBool::new(false),
        }
    }

    /// Root directory for all file operations
    pub fn working_directory(&self) -> &Path {
        &self.config.working_dir
    }

    /// Point the loop at a different working directory. Takes effect on the
    /// next iteration; the next bootstrap still only runs if it has not run
    /// before.
    pub fn set_working_directory(&mut self, dir: PathBuf) {
        self.config.working_dir = dir;
    }

    /// Run one complete iteration: bootstrap-if-needed, capture, classify.
    ///
    /// Every failure is recovered into an `IterationResult`; this method
    /// never propagates an error to the caller.
    pub async fn run_single_iteration(&self) -> IterationResult {
        if !self.bootstrapped.load(Ordering::SeqCst) {
            if let Err(e) = self.bootstrap() {
                return IterationResult::failure("Failed to create required files", e.to_string());
            }
            self.bootstrapped.store(true, Ordering::SeqCst);
        }

        let user_input = match self.capture.capture(&self.config).await {
            Ok(input) => input,
            Err(e) => {
                return IterationResult::failure("Error in task loop iteration", e.to_string())
            }
        };

        if user_input.is_empty() {
            return IterationResult::failure(
                "No input received from user",
                Cursor25xError::EmptyInput.to_string(),
            );
        }

        debug!("captured input: {user_input}");
        let message = classify(&user_input).message(&user_input);
        info!("{message}");

        IterationResult::success(message, user_input)
    }

    fn bootstrap(&self) -> Result<()> {
        let script_path = self.config.input_script_path();
        if ensure_artifact(&script_path, INPUT_SCRIPT)? {
            info!("created input script: {}", script_path.display());
        }

        let rules_path = self.config.rules_doc_path();
        if ensure_artifact(&rules_path, RULES_DOC)? {
            info!("created rules document: {}", rules_path.display());
        }

        Ok(())
    }
}
