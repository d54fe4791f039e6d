//! Integration tests that drive the compiled binary over its stdio protocol.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn spawn_server(workspace: &TempDir) -> std::process::Child {
    Command::new(env!("CARGO_BIN_EXE_cursor25x"))
        .arg("--workspace")
        .arg(workspace.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn cursor25x")
}

#[test]
fn version_flag_shows_cargo_version() {
    let cargo_version = env!("CARGO_PKG_VERSION");

    let output = Command::new(env!("CARGO_BIN_EXE_cursor25x"))
        .arg("--version")
        .output()
        .expect("Failed to execute cursor25x --version");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.contains(cargo_version),
        "Output '{}' should contain version '{}'",
        stdout.trim(),
        cargo_version
    );
    assert!(stdout.contains("cursor25x"));
}

#[test]
fn initialize_handshake_over_stdio() {
    let workspace = TempDir::new().unwrap();
    let mut child = spawn_server(&workspace);

    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(
            stdin,
            r#"{{"jsonrpc":"2.0","method":"initialize","id":1}}"#
        )
        .unwrap();
        writeln!(stdin, r#"{{"jsonrpc":"2.0","method":"tools/list","id":2}}"#).unwrap();
    }
    // Dropping stdin closes it; the server exits 0 on EOF
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("server did not exit");
    assert!(output.status.success(), "expected exit 0 on stdin EOF");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();

    let init: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(init["result"]["serverInfo"]["name"], "cursor25x");
    assert_eq!(init["id"], 1);

    let list: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "start_task_loop");

    // The handshake alone must not scaffold anything
    assert!(!workspace.path().join("cursor25xinput.cjs").exists());
}
