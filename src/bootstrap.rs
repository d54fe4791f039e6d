//! Artifact scaffolding for the working directory.
//!
//! Two fixed-content files are created on first use and never regenerated:
//! the input-capture script and the rules document. A pre-existing file is
//! left untouched regardless of its content.

use std::path::Path;

use tracing::debug;

use crate::error::{Cursor25xError, Result};

/// File name of the input-capture script
pub const INPUT_SCRIPT_NAME: &str = "cursor25xinput.cjs";

/// File name of the rules document (under `.cursor/rules/`)
pub const RULES_DOC_NAME: &str = "cursor25x.mdc";

/// Fixed content of the input-capture script. The script prints a prompt to
/// the controlling terminal, reads one line from stdin, echoes it verbatim
/// to stdout, and exits 0.
pub const INPUT_SCRIPT: &str = r#"// cursor25xinput.cjs - CURSOR25X Interactive Input Handler
const readline = require('readline');

const rl = readline.createInterface({
    input: process.stdin,
    output: process.stdout
});

rl.question('🚀 CURSOR25X prompt: ', (answer) => {
    console.log(answer);
    rl.close();
});
"#;

/// Fixed content of the rules document
pub const RULES_DOC: &str = r#"---
description: Interactive Task Loop Rules
globs: ["**/*"]
alwaysApply: true
---

### ✅ Task: Interactive Task Loop with User Feedback

1. **Check if `cursor25xinput.cjs` exists** in the root directory.

   * If it doesn't exist, create it with the following content:

     ```js
   // cursor25xinput.cjs - CURSOR25X Interactive Input Handler
const readline = require('readline');

const rl = readline.createInterface({
    input: process.stdin,
    output: process.stdout
});

rl.question('🚀 CURSOR25X prompt: ', (answer) => {
    console.log(answer);
    rl.close();
});
     ```

2. **Main Workflow**:

   * Perform your assigned tasks.

   * Run:

     ```bash
     node cursor25xinput.cjs
     ```
   * The terminal should be opened in the chat window itself.

   * Read the user's input.

   * Based on the input, perform the next set of tasks.

   * Repeat the process.

3. **Exit Condition**:

   * If the user enters `"cursor25x finish"` when prompted, exit the loop and terminate the process."#;

/// Ensure an artifact exists at `path` with the given content.
///
/// Returns `Ok(true)` when the file was written by this call, `Ok(false)`
/// when it already existed (it is left untouched, even if its content
/// differs). Missing parent directories are created first. A single failed
/// write yields an error; there are no retries.
pub fn ensure_artifact(path: &Path, content: &str) -> Result<bool> {
    if path.exists() {
        debug!("artifact already present: {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Cursor25xError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, content).map_err(|source| Cursor25xError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("created artifact: {}", path.display());
    Ok(true)
}
