//! Black-box tests of the `quorum` binary.
//!
//! Every command runs in a fresh temporary directory with `QUORUM_HOME`
//! pointed at it and service credentials removed, so no test reaches the
//! network or a developer's own configuration.

use assert_cmd::assert::OutputAssertExt;
use camino::Utf8PathBuf;
use predicates::prelude::*;
use quorum_aggregate::{ResultAggregator, SNAPSHOT_FILE};
use quorum_utils::{TaskMetadata, TaskResult};
use serde_json::json;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

const CREDENTIAL_VARS: [&str; 5] = [
    "PERPLEXITY_API_KEY",
    "XAI_API_KEY",
    "GEMINI_API_KEY",
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
];

fn quorum(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("quorum"));
    cmd.current_dir(dir)
        .env("QUORUM_HOME", dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    quorum(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quorum"));
}

#[test]
fn status_without_credentials() {
    let dir = TempDir::new().unwrap();
    quorum(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration: built-in defaults"))
        .stdout(predicate::str::contains("0/5 services available"))
        .stdout(predicate::str::contains("XAI_API_KEY"));
}

#[test]
fn status_json_reports_availability() {
    let dir = TempDir::new().unwrap();
    let output = quorum(dir.path())
        .args(["status", "--json"])
        .env("OPENAI_API_KEY", "sk-test")
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let services = doc["services"].as_array().unwrap();
    assert_eq!(services.len(), 5);
    let openai = services.iter().find(|s| s["name"] == "openai").unwrap();
    assert_eq!(openai["available"], true);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("sk-test"));
}

#[test]
fn estimate_lists_every_service() {
    let dir = TempDir::new().unwrap();
    let mut assert = quorum(dir.path()).arg("estimate").assert().success();
    for service in ["perplexity", "grok", "gemini", "claude", "openai"] {
        assert = assert.stdout(predicate::str::contains(service));
    }
    assert.stdout(predicate::str::contains("Total: 15 tasks"));
}

#[test]
fn estimate_json_totals() {
    let dir = TempDir::new().unwrap();
    let output = quorum(dir.path())
        .args(["estimate", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["total_tasks"], 15);
    assert!(doc["total_usd"].as_f64().unwrap() > 0.0);
}

#[test]
fn run_unknown_phase_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    quorum(dir.path())
        .args(["run", "--phase", "launch_party", "--output-dir", "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown phase: launch_party"));
}

#[test]
fn run_with_no_services_skips_every_task() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    quorum(dir.path())
        .args(["run", "--no-gates", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ research_validation: no gate"))
        .stdout(predicate::str::contains("3 skipped"))
        .stdout(predicate::str::contains("✓ Run completed"));

    assert!(out.join("synthesis_report.md").is_file());
    assert!(out.join("run_manifest.json").is_file());
    assert!(out.join(SNAPSHOT_FILE).is_file());

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("run_manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["phases"].as_array().unwrap().len(), 5);
    assert_eq!(manifest["services"]["claude"], false);
}

#[test]
fn rerun_of_one_phase_extends_the_previous_run() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    quorum(dir.path())
        .args(["run", "--no-gates", "--output-dir"])
        .arg(&out)
        .assert()
        .success();
    quorum(dir.path())
        .args(["run", "--no-gates", "--phase", "spec_hardening", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("run_manifest.json")).unwrap())
            .unwrap();
    let phases: Vec<&str> = manifest["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["phase"].as_str().unwrap())
        .collect();
    assert_eq!(phases.len(), 6);
    assert_eq!(phases[0], "research_validation");
    assert_eq!(phases[5], "spec_hardening");
    assert!(manifest["documents"]["synthesis_report.md"].is_string());
}

#[test]
fn invalid_config_file_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[defaults]\nmax_attempts = 0\n").unwrap();

    quorum(dir.path()).arg("estimate").assert().code(2);
}

#[test]
fn explicit_missing_config_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    quorum(dir.path())
        .args(["--config", "nowhere.toml", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nowhere.toml"));
}

#[test]
fn synthesis_without_run_output() {
    let dir = TempDir::new().unwrap();
    quorum(dir.path())
        .args(["synthesis", "--output-dir", "missing"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Run artifacts unavailable"));
}

#[test]
fn synthesis_renders_saved_snapshot() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();

    let mut agg = ResultAggregator::new();
    for (task, total) in [("budget_plan", 1000), ("timeline_review", 1400)] {
        agg.add_result(
            "implementation_planning",
            task,
            TaskResult::success(
                task,
                "openai",
                "Figures attached.",
                Some(json!({"budget": {"total": total}})),
                TaskMetadata::default(),
            ),
        );
    }
    let snapshot_path = Utf8PathBuf::from_path_buf(out.join(SNAPSHOT_FILE)).unwrap();
    agg.snapshot().save(&snapshot_path).unwrap();

    quorum(dir.path())
        .args(["synthesis", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Synthesis Report"))
        .stdout(predicate::str::contains("- Numeric conflicts: 1"))
        .stdout(predicate::str::contains("budget.total"));

    let structured = quorum(dir.path())
        .args(["synthesis", "--format", "structured", "--output-dir"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(structured.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&structured.stdout).unwrap();
    assert_eq!(doc["conflicts"].as_array().unwrap().len(), 1);
}
