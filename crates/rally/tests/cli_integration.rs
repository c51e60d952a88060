//! CLI integration tests for the Rally command-line interface.
//!
//! Each test runs against a throwaway config directory and data file, so
//! state carries across invocations only through the file backend.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn data_file(&self) -> PathBuf {
        self.path().join("data").join("rally.json")
    }

    /// A `rally` command isolated to this sandbox.
    fn rally(&self) -> Command {
        let mut cmd = Command::cargo_bin("rally").unwrap();
        cmd.current_dir(self.path())
            .env("RALLY_CONFIG_DIR", self.path().join("config"))
            .env("RALLY_DATA_FILE", self.data_file())
            .env_remove("RALLY_SERVER");
        cmd
    }

    /// Run with `--json` and parse stdout.
    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.rally().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "rally {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn create(&self, owner: &str, capacity: usize) -> String {
        let created = self.json(&["create", "--owner", owner, "--capacity", &capacity.to_string()]);
        created["sessionId"].as_str().unwrap().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    Sandbox::new()
        .rally()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity-bounded session scheduling"));
}

#[test]
fn test_version_displays() {
    Sandbox::new()
        .rally()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rally"));
}

#[test]
fn test_help_lists_subcommands() {
    Sandbox::new()
        .rally()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("join"))
        .stdout(predicate::str::contains("leave"))
        .stdout(predicate::str::contains("capacity"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("close"))
        .stdout(predicate::str::contains("broadcast"))
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("config"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_store_backend_rejected() {
    Sandbox::new()
        .rally()
        .args(["--store", "postgres", "sessions", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown store backend"));
}

#[test]
fn test_start_requires_target() {
    Sandbox::new()
        .rally()
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--owner"));
}

#[test]
fn test_join_requires_user() {
    Sandbox::new()
        .rally()
        .args(["join", "some-session"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Workflow
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_create_then_list() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 3);

    sandbox
        .rally()
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("1/3"))
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn test_join_overflows_to_waitlist_across_invocations() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 2);

    let bob = sandbox.json(&["join", &id, "bob"]);
    assert_eq!(bob["status"], "confirmed");

    let carol = sandbox.json(&["join", &id, "carol"]);
    assert_eq!(carol["status"], "waitlisted");
    assert_eq!(carol["position"], 1);

    let record = sandbox.json(&["sessions", "show", &id]);
    assert_eq!(record["confirmed"], serde_json::json!(["alice", "bob"]));
    assert_eq!(record["waitlisted"], serde_json::json!(["carol"]));

    // Leaving frees a seat for the head of the waitlist
    let left = sandbox.json(&["leave", &id, "bob"]);
    assert_eq!(left["status"], "removed");
    let record = sandbox.json(&["sessions", "show", &id]);
    assert_eq!(record["confirmed"], serde_json::json!(["alice", "carol"]));
}

#[test]
fn test_join_prints_direct_messages() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 4);

    sandbox
        .rally()
        .args(["join", &id, "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[dm bob]"))
        .stdout(predicate::str::contains(format!("[edit {id}]")));
}

#[test]
fn test_duplicate_join_fails() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 4);

    sandbox
        .rally()
        .args(["join", &id, "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already"));
}

#[test]
fn test_start_by_owner_removes_session() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 4);
    sandbox.json(&["join", &id, "bob"]);

    sandbox
        .rally()
        .args(["start", "--owner", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[dm bob]"))
        .stdout(predicate::str::contains("Session started"));

    let sessions = sandbox.json(&["sessions", "list"]);
    assert_eq!(sessions, serde_json::json!([]));
}

#[test]
fn test_close_without_session_fails() {
    Sandbox::new()
        .rally()
        .args(["close", "--owner", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no active session"));
}

#[test]
fn test_capacity_promotes_waitlist() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 1);
    sandbox.json(&["join", &id, "bob"]);

    let resized = sandbox.json(&["capacity", "--owner", "alice", "2"]);
    assert_eq!(resized["promoted"], serde_json::json!(["bob"]));
}

#[test]
fn test_broadcast_reaches_members() {
    let sandbox = Sandbox::new();
    let id = sandbox.create("alice", 4);
    sandbox.json(&["join", &id, "bob"]);
    sandbox.json(&["join", &id, "carol"]);

    let sent = sandbox.json(&["broadcast", "--owner", "alice", "running", "late"]);
    assert_eq!(sent["sent"], 2);
}

#[test]
fn test_sessions_are_scoped_to_server() {
    let sandbox = Sandbox::new();
    sandbox.create("alice", 4);

    let elsewhere = sandbox.json(&["--server", "other", "sessions", "list"]);
    assert_eq!(elsewhere, serde_json::json!([]));
}

#[test]
fn test_reconcile_clean_store() {
    let sandbox = Sandbox::new();
    sandbox.create("alice", 4);

    let report = sandbox.json(&["reconcile"]);
    assert_eq!(report["sessionsChecked"], 1);
    assert_eq!(report["sessionsDropped"], 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_config_dir() {
    let sandbox = Sandbox::new();
    sandbox
        .rally()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_which_reports_missing_files() {
    Sandbox::new()
        .rally()
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"))
        .stdout(predicate::str::contains("rally.toml"));
}

#[test]
fn test_project_template_applies_to_create() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.path().join("rally.toml"),
        "[templates.raid]\nname = \"Raid Night\"\ncapacity = 8\n",
    )
    .unwrap();

    let created = sandbox.json(&["create", "--owner", "alice", "--template", "raid"]);
    assert_eq!(created["parameters"]["name"], "Raid Night");
    assert_eq!(created["parameters"]["capacity"], 8);

    sandbox
        .rally()
        .args(["create", "--owner", "bob", "--template", "quick"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("raid"));
}

#[test]
fn test_config_init_then_show() {
    let sandbox = Sandbox::new();
    sandbox
        .rally()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    sandbox
        .rally()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Game Night"));
}
