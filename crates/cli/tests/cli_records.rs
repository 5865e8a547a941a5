use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../context/tests/fixtures")
        .join(name)
}

#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("trigger-context").expect("binary")
}

#[test]
fn inspect_prints_summary_of_legacy_action() {
    let output = cli()
        .arg("--quiet")
        .arg("inspect")
        .arg(fixture("retrigger_action_old_data.xml"))
        .output()
        .expect("command run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["kind"], "action");
    let context = &body["contexts"][0];
    assert_eq!(context["event"], "patchset-created");
    assert_eq!(context["project"], "semctools/hudson/plugins/gerrit-trigger-plugin");
    assert_eq!(context["thisBuild"]["ownerId"], "EXPERIMENTAL_Gerrit_Trigger_1");
    assert_eq!(context["thisBuild"]["buildNumber"], 6);
    assert_eq!(context["others"][0]["buildNumber"], 16);
}

#[test]
fn inspect_matrix_build_reports_owner_only_reference() {
    let output = cli()
        .args(["--quiet", "inspect", "--kind", "build"])
        .arg(fixture("matrix_build.xml"))
        .output()
        .expect("command run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["contexts"].as_array().map(Vec::len), Some(1));
    let other = &body["contexts"][0]["others"][0];
    assert_eq!(other["ownerId"], "master-theme");
    assert!(other.get("buildNumber").is_none());
}

#[test]
fn migrate_writes_current_layout_that_checks_clean() {
    let temp = tempdir().unwrap();
    let output = temp.path().join("migrated.xml");

    cli()
        .args(["--quiet", "migrate"])
        .arg(fixture("retrigger_action_old_data.xml"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let migrated = fs::read_to_string(&output).unwrap();
    assert!(migrated.contains("<itemReference>"));
    assert!(!migrated.contains("<thisRun>"));

    cli()
        .arg("check")
        .arg(&output)
        .arg("--require-context")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn migrate_to_stdout_honours_reference_style() {
    cli()
        .args(["--quiet", "--reference-style", "relative-path", "--indent", "0", "migrate"])
        .arg(fixture("matrix_build.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"reference="../../../causes/triggerCause/context""#,
        ));
}

#[test]
fn check_fails_when_any_record_is_broken() {
    let temp = tempdir().unwrap();
    let broken = temp.path().join("broken.xml");
    fs::write(&broken, "<retriggerAction><context>").unwrap();

    cli()
        .arg("check")
        .arg(fixture("matrix_build.xml"))
        .arg(&broken)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("1 of 2 record(s) failed"));
}

#[test]
fn check_json_reports_each_record() {
    let temp = tempdir().unwrap();
    let unknown = temp.path().join("unknown.xml");
    fs::write(&unknown, "<project/>").unwrap();

    let output = cli()
        .args(["check", "--json"])
        .arg(fixture("retrigger_action_old_data.xml"))
        .arg(&unknown)
        .output()
        .expect("command run");
    assert!(!output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body[0]["ok"], true);
    assert_eq!(body[0]["kind"], "action");
    assert_eq!(body[1]["ok"], false);
    assert!(body[1]["error"]
        .as_str()
        .unwrap_or_default()
        .contains("Unknown record root"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("doc.toml");
    fs::write(&config, "max_depth = 0\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(fixture("matrix_build.xml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_depth"));
}
