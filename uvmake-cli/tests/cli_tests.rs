use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn uvmake_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("uvmake"));
    cmd.current_dir(root).env("RUST_LOG", "warn");
    cmd
}

fn write_tree(root: &Path, workspace: &str, body: &str) {
    fs::write(
        root.join("uvmake.yaml"),
        format!("workspace:\n{workspace}{body}"),
    )
    .expect("write uvmake.yaml");
}

const DEMO: &str = "  package_name: demo\n  python: \">=3.12\"\n";

#[test]
fn status_before_first_configure_reports_never_configured() {
    let root = TempDir::new().expect("root");
    write_tree(root.path(), DEMO, "projects: [a]\n");

    uvmake_cmd(root.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(contains("NEVER CONFIGURED"))
        .stdout(contains("uvmake configure"));
}

#[test]
fn status_json_is_machine_readable() {
    let root = TempDir::new().expect("root");
    write_tree(root.path(), DEMO, "");

    let output = uvmake_cmd(root.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["status"], "never_configured");
    assert_eq!(json["package"], "demo");
    assert_eq!(json["mode"], "managed");
    assert!(json["configured_at"].is_null());
}

#[test]
fn conflicting_manifests_fail_without_touching_disk() {
    let root = TempDir::new().expect("root");
    write_tree(
        root.path(),
        &format!("{DEMO}  manifest: pyproject.toml\n  unmanaged_manifest: py/pyproject.toml\n"),
        "projects: [a]\n",
    );

    uvmake_cmd(root.path())
        .args(["configure"])
        .assert()
        .failure()
        .stderr(contains("choose one"));
    assert!(!root.path().join("pyproject.toml").exists());
    assert!(!root.path().join(".uvmake").exists());
}

#[test]
fn conflicting_manifest_flags_are_rejected_by_the_parser() {
    let root = TempDir::new().expect("root");
    write_tree(root.path(), DEMO, "");

    uvmake_cmd(root.path())
        .args([
            "configure",
            "--manifest",
            "pyproject.toml",
            "--unmanaged-manifest",
            "py/pyproject.toml",
        ])
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));
    assert!(!root.path().join(".uvmake").exists());
}

#[test]
fn missing_uv_fails_at_the_sync_step() {
    let root = TempDir::new().expect("root");
    write_tree(root.path(), DEMO, "");

    uvmake_cmd(root.path())
        .args(["configure", "--uv", "/nonexistent/uvmake-test/uv"])
        .assert()
        .failure()
        .stderr(contains("sync-environment"));
    assert!(root.path().join("pyproject.toml").exists());
}

#[test]
fn install_requires_an_install_environment() {
    let root = TempDir::new().expect("root");
    write_tree(root.path(), DEMO, "");

    uvmake_cmd(root.path())
        .args(["install", "--no-configure"])
        .assert()
        .failure()
        .stderr(contains("install_environment"));
}

// ---------------------------------------------------------------------------
// End to end against a stand-in `uv`
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn fake_uv(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("uv");
    fs::write(
        &script,
        "#!/bin/sh\n\
         echo \"$1 VIRTUAL_ENV=$VIRTUAL_ENV\" >> \"$(dirname \"$0\")/uv.log\"\n\
         if [ \"$1\" = version ]; then echo \"$(basename \"$3\") 0.1.0\"; fi\n\
         exit 0\n",
    )
    .expect("write fake uv");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
    script
}

#[cfg(unix)]
fn log_lines(tools: &Path) -> Vec<String> {
    fs::read_to_string(tools.join("uv.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
#[cfg(unix)]
fn configure_twice_only_syncs_the_second_time() {
    let root = TempDir::new().expect("root");
    let tools = TempDir::new().expect("tools");
    let uv = fake_uv(tools.path());
    write_tree(
        root.path(),
        DEMO,
        "projects: [a, b]\ndev_dependencies: [\"jinja2>=3.1.6\"]\n",
    );
    let dev_env = root.path().canonicalize().expect("canonical root").join(".venv");
    let expected_sync = format!("sync VIRTUAL_ENV={}", dev_env.display());

    uvmake_cmd(root.path())
        .args(["configure", "--uv"])
        .arg(&uv)
        .env("VIRTUAL_ENV", "/somewhere/else")
        .assert()
        .success()
        .stdout(contains("manifest regenerated (2 member(s))"));

    let first = log_lines(tools.path());
    assert_eq!(first.len(), 4, "log: {first:?}");
    assert!(first[0].starts_with("version "));
    assert!(first[1].starts_with("version "));
    assert!(first[2].starts_with("add "));
    assert_eq!(first[3], expected_sync);

    let manifest = fs::read_to_string(root.path().join("pyproject.toml")).expect("manifest");
    assert!(manifest.contains("name = \"demo\""));
    assert!(manifest.contains("\"a\" = { workspace = true }"));

    uvmake_cmd(root.path())
        .args(["configure", "--uv"])
        .arg(&uv)
        .assert()
        .success()
        .stdout(contains("unchanged"));

    let second = log_lines(tools.path());
    assert_eq!(second.len(), 5, "log: {second:?}");
    assert!(second[4].starts_with("sync "));

    uvmake_cmd(root.path())
        .args(["status", "--uv"])
        .arg(&uv)
        .assert()
        .success()
        .stdout(contains("CURRENT"));
}
