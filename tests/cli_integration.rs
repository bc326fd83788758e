//! CLI integration tests for Shipyard.
//!
//! These tests run the binary against small Node projects laid out in a
//! temporary directory, with an installed `node_modules` tree.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const HOST_LICENSE: &str = "Copyright (c) Example Corp\n";

/// Get the shipyard binary command, isolated from the user's environment.
fn shipyard(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shipyard").unwrap();
    cmd.current_dir(project)
        .env_remove("SHIPYARD_BUILD_MODE")
        .env("XDG_CONFIG_HOME", project.join(".xdg"))
        .arg("--no-color");
    cmd
}

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
}

fn install(root: &Path, name: &str, version: &str, license: Option<&str>) {
    let mut json = serde_json::json!({ "name": name, "version": version });
    if let Some(license) = license {
        json["license"] = serde_json::json!(license);
        json["repository"] = serde_json::json!(format!("github:example/{}", name));
    }
    write(
        root,
        &format!("node_modules/{}/package.json", name),
        &serde_json::to_string_pretty(&json).unwrap(),
    );
}

/// A desktop app with one external native module and one bundled package.
fn app(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write(
        root,
        "package.json",
        r#"{
  "name": "desktop-app",
  "version": "1.2.3",
  "license": "GPL-3.0-only",
  "repository": "github:example/desktop-app",
  "scripts": { "build": "webpack" },
  "dependencies": { "sqlite3": "^5.0.0", "left-pad": "^1.3.0" },
  "devDependencies": { "jest": "^29.0.0", "sqlite3": "^5.0.0" }
}"#,
    );
    write(root, "LICENSE", HOST_LICENSE);
    write(root, "Shipyard.toml", config);
    install(root, "sqlite3", "5.1.6", Some("BSD-3-Clause"));
    install(root, "left-pad", "1.3.0", Some("WTFPL"));

    tmp
}

const EXTERNALS: &str = "[bundle]\nexternals = [\"sqlite3\"]\ndrop-fields = [\"scripts\"]\n";

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// shipyard prune
// ============================================================================

#[test]
fn test_prune_writes_descriptor() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path()).arg("prune").assert().success();

    let written = read_json(&tmp.path().join("dist/app/package.json"));
    assert_eq!(written["dependencies"], serde_json::json!({ "sqlite3": "^5.0.0" }));
    assert_eq!(written["devDependencies"], serde_json::json!({ "sqlite3": "^5.0.0" }));
    assert!(written.get("scripts").is_none());
    assert_eq!(written["name"], "desktop-app");
}

#[test]
fn test_prune_production_drops_dev_dependencies() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path())
        .args(["--mode", "production", "prune"])
        .assert()
        .success();

    let written = read_json(&tmp.path().join("dist/app/package.json"));
    assert!(written.get("devDependencies").is_none());
}

#[test]
fn test_prune_mode_from_env() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path())
        .env("SHIPYARD_BUILD_MODE", "production")
        .args(["prune", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sqlite3\""))
        .stdout(predicate::str::contains("devDependencies").not());

    assert!(!tmp.path().join("dist/app/package.json").exists());
}

#[test]
fn test_invalid_mode() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path())
        .args(["--mode", "staging", "prune"])
        .assert()
        .failure();
}

// ============================================================================
// shipyard build
// ============================================================================

#[test]
fn test_build_writes_summary() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path())
        .args(["--mode", "production", "build"])
        .assert()
        .success();

    let summary = read_json(&tmp.path().join("dist/app/licenses.json"));
    let entries = summary.as_object().unwrap();
    assert_eq!(entries.len(), 3);

    let host = &summary["desktop-app@1.2.3"];
    assert_eq!(host["license"], "GPL-3.0-only");
    assert_eq!(host["sourceText"], HOST_LICENSE);
    assert!(host["source"].as_str().unwrap().ends_with("/release-1.2.3/LICENSE"));
    assert_eq!(summary["left-pad@1.3.0"]["license"], "WTFPL");
}

#[test]
fn test_default_command_is_build() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path()).assert().success();

    assert!(tmp.path().join("dist/app/package.json").exists());
    assert!(tmp.path().join("dist/app/licenses.json").exists());
}

#[test]
fn test_production_license_failure() {
    let tmp = app(EXTERNALS);
    install(tmp.path(), "left-pad", "1.3.0", None);

    shipyard(tmp.path())
        .args(["--mode", "production", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("left-pad@1.3.0"))
        .stderr(predicate::str::contains("UNKNOWN"))
        .stderr(predicate::str::contains("[licenses.overrides]"));

    assert!(!tmp.path().join("dist/app/licenses.json").exists());
}

#[test]
fn test_development_license_failure_warns() {
    let tmp = app(EXTERNALS);
    install(tmp.path(), "left-pad", "1.3.0", None);

    shipyard(tmp.path())
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"))
        .stderr(predicate::str::contains("left-pad@1.3.0"));

    assert!(tmp.path().join("dist/app/package.json").exists());
    assert!(!tmp.path().join("dist/app/licenses.json").exists());
}

#[test]
fn test_override_approves_package() {
    let tmp = app(&format!("{}\n[licenses.overrides]\n\"left-pad@1.3.0\" = \"MIT\"\n", EXTERNALS));
    install(tmp.path(), "left-pad", "1.3.0", None);

    shipyard(tmp.path())
        .args(["--mode", "production", "build"])
        .assert()
        .success();

    let summary = read_json(&tmp.path().join("dist/app/licenses.json"));
    assert_eq!(summary["left-pad@1.3.0"]["license"], "MIT");
}

#[test]
fn test_missing_dependency_fails_in_development() {
    let tmp = app(EXTERNALS);
    fs::remove_dir_all(tmp.path().join("node_modules/left-pad")).unwrap();

    shipyard(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("left-pad"));
}

#[test]
fn test_missing_config() {
    let tmp = TempDir::new().unwrap();

    shipyard(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find Shipyard.toml"));
}

#[test]
fn test_project_flag() {
    let tmp = app(EXTERNALS);
    let elsewhere = TempDir::new().unwrap();

    shipyard(elsewhere.path())
        .arg("--project")
        .arg(tmp.path())
        .arg("prune")
        .assert()
        .success();

    assert!(tmp.path().join("dist/app/package.json").exists());
}

// ============================================================================
// shipyard licenses
// ============================================================================

#[test]
fn test_licenses_check_only() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path())
        .args(["licenses", "--check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("approved"));

    assert!(!tmp.path().join("dist/app/licenses.json").exists());
}

#[test]
fn test_licenses_custom_output() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path())
        .args(["licenses", "--output", "out/third-party.json"])
        .assert()
        .success();

    let summary = read_json(&tmp.path().join("out/third-party.json"));
    assert!(summary.get("sqlite3@5.1.6").is_some());
}

#[test]
fn test_licenses_failure_removes_stale_summary() {
    let tmp = app(EXTERNALS);

    shipyard(tmp.path()).arg("licenses").assert().success();
    let summary = tmp.path().join("dist/app/licenses.json");
    assert!(summary.exists());

    install(tmp.path(), "left-pad", "1.3.0", None);
    shipyard(tmp.path())
        .arg("licenses")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"));

    assert!(!summary.exists());
}

#[test]
fn test_rebuild_with_unapproved_license_drops_old_summary() {
    let tmp = app(EXTERNALS);
    let summary = tmp.path().join("dist/app/licenses.json");

    shipyard(tmp.path()).arg("build").assert().success();
    assert!(summary.exists());

    install(tmp.path(), "left-pad", "1.3.0", None);
    shipyard(tmp.path()).arg("build").assert().success();

    assert!(!summary.exists());
    assert!(tmp.path().join("dist/app/package.json").exists());
}

#[test]
fn test_invalid_config_points_at_source() {
    let tmp = app("[bundle]\nexternals = \"sqlite3\"\n");

    shipyard(tmp.path())
        .arg("prune")
        .assert()
        .failure()
        .stderr(predicate::str::contains("shipyard::config::parse"))
        .stderr(predicate::str::contains("Shipyard.toml"));
}
