//! CLI Integration Tests for Synapse
//!
//! Runs the built `synapse` binary against temporary configuration files.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = r#"
[agents.loader]
type = "document_loader"

[agents.e1]
type = "echo"
name = "Echo"

[workflows.ingest]
start = "load"

[workflows.ingest.nodes.load]
target = "loader"
transitions = { success = "echo", failure = "error" }

[workflows.ingest.nodes.echo]
target = "e1"
transitions = { success = "complete" }
"#;

const DOCUMENTS: &str = r#"[
  {"id": "doc-1", "title": "One", "content": "first"},
  {"id": "doc-2", "title": "Two", "content": "second"}
]"#;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("synapse.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("documents.json"), DOCUMENTS).unwrap();
    dir
}

fn run_synapse(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_synapse"))
        .args(["--no-color"])
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute synapse")
}

// =============================================================================
// Help and Config
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let dir = setup();
    let output = run_synapse(&dir, &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["config", "agents", "workflows", "run", "batch"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_config_validate() {
    let dir = setup();
    let output = run_synapse(&dir, &["config", "--validate"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("is valid"));
}

#[test]
fn test_config_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = run_synapse(&dir, &["config"]);
    assert!(!output.status.success());
}

// =============================================================================
// Runtime commands
// =============================================================================

#[test]
fn test_agents_json() {
    let dir = setup();
    let output = run_synapse(&dir, &["--json", "agents"]);
    assert!(output.status.success());

    let agents: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(agents[0]["id"], "e1");
    assert_eq!(agents[1]["agent_type"], "document_loader");
}

#[test]
fn test_run_workflow_json() {
    let dir = setup();
    let output = run_synapse(
        &dir,
        &["--documents", "documents.json", "--json", "run", "ingest", "--input", "doc-2"],
    );
    assert!(output.status.success());

    let run: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(run["status"], "complete");
    assert_eq!(run["result"]["data"]["title"], "Two");
    assert_eq!(run["history"].as_array().unwrap().len(), 2);
}

#[test]
fn test_batch_json() {
    let dir = setup();
    let output = run_synapse(
        &dir,
        &[
            "--documents", "documents.json", "--json", "batch", "loader", "doc-1", "doc-9",
            "--max-concurrent", "1",
        ],
    );
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    let missing = outcomes.iter().find(|o| o["item_id"] == "doc-9").unwrap();
    assert_eq!(missing["status"], "error");
}

#[test]
fn test_batch_uses_configured_concurrency() {
    let dir = setup();
    let output = run_synapse(
        &dir,
        &["--documents", "documents.json", "batch", "loader", "doc-1", "doc-2"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 succeeded, 0 failed"));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("[WARN]"));
}

#[test]
fn test_run_unknown_workflow_fails() {
    let dir = setup();
    let output = run_synapse(&dir, &["run", "nope", "--input", "x"]);
    assert!(!output.status.success());
}
