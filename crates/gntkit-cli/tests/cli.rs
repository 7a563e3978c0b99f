use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use gntkit_core::Sample;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("gntkit"))
}

fn sample(label: char) -> Sample {
    Sample {
        label,
        width: 2,
        height: 2,
        pixels: vec![0x00, 0x40, 0x80, 0xFF],
    }
}

fn write_member(dir: &Path, name: &str, labels: &[char]) -> PathBuf {
    let mut bytes = Vec::new();
    for &label in labels {
        bytes.extend(sample(label).to_record_bytes().expect("encode"));
    }
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write member");
    path
}

fn write_truncated_member(dir: &Path, name: &str) -> PathBuf {
    let mut bytes = sample('中').to_record_bytes().expect("encode");
    bytes.extend_from_slice(&[0x0E, 0x00, 0x00, 0x00, 0xD6]);
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write member");
    path
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_supports_inspect_and_analyze() {
    cmd().arg("inspect").arg("--help").assert().success();
    cmd().arg("analyze").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.gnt");

    cmd()
        .arg("inspect")
        .arg(missing)
        .arg("--stdout")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn rejects_non_gnt_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("notes.txt");
    fs::write(&input, "hello").expect("write");

    cmd()
        .arg("inspect")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn stdout_outputs_report() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "1001-c.gnt", &['中', '文', '中']);

    let assert = cmd()
        .arg("inspect")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["samples_total"], 3);
    assert_eq!(json["labels_total"], 2);
    assert_eq!(json["members"][0]["status"], "ok");
    assert_eq!(json["tool"]["name"], "gntkit");
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "a.gnt", &['中']);

    cmd()
        .arg("inspect")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(temp.path().join("report.json"))
        .assert()
        .failure();
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "a.gnt", &['中']);
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("inspect")
        .arg(input)
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));

    let contents = fs::read_to_string(&report).expect("report");
    assert!(contents.contains('\n'));
    let json: Value = serde_json::from_str(&contents).expect("json");
    assert_eq!(json["samples_total"], 1);
}

#[test]
fn quiet_suppresses_ok_line() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "a.gnt", &['中']);

    cmd()
        .arg("--quiet")
        .arg("inspect")
        .arg(input)
        .arg("-o")
        .arg(temp.path().join("report.json"))
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn directory_input_reads_members_in_order() {
    let temp = TempDir::new().expect("tempdir");
    write_member(temp.path(), "b.gnt", &['文']);
    write_member(temp.path(), "a.gnt", &['中', '中']);
    fs::write(temp.path().join("readme.txt"), "skip").expect("write");

    let assert = cmd()
        .arg("inspect")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    let members = json["members"].as_array().expect("members");
    assert_eq!(members.len(), 2);
    assert!(members[0]["name"].as_str().expect("name").ends_with("a.gnt"));
    assert_eq!(members[0]["samples"], 2);
    assert_eq!(json["samples_total"], 3);
}

#[test]
fn glob_input_matches_gnt_files() {
    let temp = TempDir::new().expect("tempdir");
    write_member(temp.path(), "x.gnt", &['中']);
    write_member(temp.path(), "y.gnt", &['文']);
    let pattern = temp.path().join("*.gnt");

    let assert = cmd()
        .arg("inspect")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["samples_total"], 2);
}

#[test]
fn truncated_member_aborts_by_default() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_truncated_member(temp.path(), "broken.gnt");

    cmd()
        .arg("inspect")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("broken.gnt").and(contains("offset 14")));
}

#[test]
fn skip_policy_reports_failed_member() {
    let temp = TempDir::new().expect("tempdir");
    write_truncated_member(temp.path(), "a.gnt");
    write_member(temp.path(), "b.gnt", &['文']);

    let assert = cmd()
        .arg("inspect")
        .arg(temp.path())
        .arg("--stdout")
        .arg("--on-error")
        .arg("skip")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["samples_total"], 2);
    assert_eq!(json["members"][0]["status"], "failed");
    assert_eq!(json["members"][1]["status"], "ok");
}

#[test]
fn strict_fails_on_skipped_member() {
    let temp = TempDir::new().expect("tempdir");
    write_truncated_member(temp.path(), "a.gnt");

    cmd()
        .arg("inspect")
        .arg(temp.path())
        .arg("--stdout")
        .arg("--on-error")
        .arg("skip")
        .arg("--strict")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("corpus problems detected"));
}

#[test]
fn check_length_records_warnings() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = sample('中').to_record_bytes().expect("encode");
    bytes[0] = 0x63;
    let input = temp.path().join("a.gnt");
    fs::write(&input, bytes).expect("write");

    let assert = cmd()
        .arg("inspect")
        .arg(&input)
        .arg("--stdout")
        .arg("--check-length")
        .assert()
        .success();
    let json = stdout_json(&assert);
    let warnings = json["warnings"].as_array().expect("warnings");
    assert_eq!(warnings.len(), 1);

    let assert = cmd()
        .arg("inspect")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .success();
    assert!(stdout_json(&assert).get("warnings").is_none());
}

#[test]
fn export_writes_png_tree() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "a.gnt", &['中', '文', '中']);
    let out = temp.path().join("raw");
    let summary = temp.path().join("summary.json");

    cmd()
        .arg("export")
        .arg(input)
        .arg("--out")
        .arg(&out)
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success()
        .stderr(contains("OK: 3 samples (2 labels)"));

    assert!(out.join("中").join("中_1.png").is_file());
    assert!(out.join("中").join("中_2.png").is_file());
    assert!(out.join("文").join("文_1.png").is_file());
    let json: Value =
        serde_json::from_str(&fs::read_to_string(summary).expect("summary")).expect("json");
    assert_eq!(json["samples_written"], 3);
}

#[test]
fn export_refuses_file_as_output() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "a.gnt", &['中']);
    let out = temp.path().join("taken");
    fs::write(&out, "x").expect("write");

    cmd()
        .arg("export")
        .arg(input)
        .arg("--out")
        .arg(out)
        .assert()
        .failure()
        .stderr(contains("not a directory"));
}

#[test]
fn dataset_input_resolves_under_root() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("HWDB1.1tst_gnt");
    fs::create_dir(&dir).expect("mkdir");
    write_member(&dir, "1241-c.gnt", &['中']);

    let assert = cmd()
        .arg("inspect")
        .arg("--dataset")
        .arg("HWDB1.1tst_gnt")
        .arg("--root")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["samples_total"], 1);
}

#[test]
fn unknown_dataset_fails_with_hint() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg("inspect")
        .arg("--dataset")
        .arg("HWDB9")
        .arg("--root")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unknown dataset").and(contains("hint:")));
}

#[test]
fn datasets_lists_presence() {
    let temp = TempDir::new().expect("tempdir");
    fs::create_dir(temp.path().join("competition-gnt")).expect("mkdir");

    let assert = cmd()
        .arg("datasets")
        .arg("--root")
        .arg(temp.path())
        .arg("--json")
        .assert()
        .success();
    let json = stdout_json(&assert);
    let entries = json.as_array().expect("entries");
    assert_eq!(entries.len(), 4);
    let competition = entries
        .iter()
        .find(|entry| entry["name"] == "competition-gnt")
        .expect("competition");
    assert_eq!(competition["present"], true);
    assert_eq!(competition["kind"], "gnt");

    cmd()
        .arg("datasets")
        .arg("--root")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("competition-gnt").and(contains("present")));
}

#[test]
fn datasets_accepts_custom_registry() {
    let temp = TempDir::new().expect("tempdir");
    let registry = temp.path().join("registry.json");
    fs::write(
        &registry,
        r#"{"datasets": [{"name": "lines", "url": "http://example.invalid/l.zip", "kind": "dgr"}]}"#,
    )
    .expect("write");

    cmd()
        .arg("datasets")
        .arg("--registry")
        .arg(&registry)
        .arg("--root")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("lines").and(contains("dgr")).and(contains("missing")));
}

fn write_two_gnt_registry(root: &Path) -> PathBuf {
    let registry = root.join("registry.json");
    fs::write(
        &registry,
        r#"{"datasets": [
            {"name": "trn", "url": "http://example.invalid/trn.zip", "kind": "gnt"},
            {"name": "lines", "url": "http://example.invalid/lines.zip", "kind": "dgr"},
            {"name": "tst", "url": "http://example.invalid/tst.zip", "kind": "gnt"}
        ]}"#,
    )
    .expect("write");
    for name in ["trn", "tst"] {
        fs::create_dir(root.join(name)).expect("mkdir");
    }
    write_member(&root.join("trn"), "1001-c.gnt", &['中', '文']);
    write_member(&root.join("tst"), "1241-c.gnt", &['中']);
    registry
}

#[test]
fn all_datasets_inspects_every_character_set() {
    let temp = TempDir::new().expect("tempdir");
    let registry = write_two_gnt_registry(temp.path());

    let assert = cmd()
        .arg("inspect")
        .arg("--all-datasets")
        .arg("--registry")
        .arg(&registry)
        .arg("--root")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["samples_total"], 3);
    assert_eq!(json["members"].as_array().expect("members").len(), 2);
}

#[test]
fn all_datasets_export_splits_by_dataset() {
    let temp = TempDir::new().expect("tempdir");
    let registry = write_two_gnt_registry(temp.path());
    let out = temp.path().join("raw");

    cmd()
        .arg("export")
        .arg("--all-datasets")
        .arg("--registry")
        .arg(&registry)
        .arg("--root")
        .arg(temp.path())
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("OK: 3 samples (2 labels)"));

    assert!(out.join("trn").join("中").join("中_1.png").is_file());
    assert!(out.join("trn").join("文").join("文_1.png").is_file());
    assert!(out.join("tst").join("中").join("中_1.png").is_file());
    assert!(!out.join("lines").exists());
    assert!(!out.join("中").exists());
}

#[test]
fn all_datasets_needs_every_character_set() {
    let temp = TempDir::new().expect("tempdir");
    let registry = write_two_gnt_registry(temp.path());
    fs::remove_dir_all(temp.path().join("tst")).expect("rmdir");

    cmd()
        .arg("inspect")
        .arg("--all-datasets")
        .arg("--registry")
        .arg(&registry)
        .arg("--root")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("hint:"));
}

#[test]
fn all_datasets_conflicts_with_inputs() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "a.gnt", &['中']);

    cmd()
        .arg("inspect")
        .arg(input)
        .arg("--all-datasets")
        .arg("--stdout")
        .assert()
        .failure();
}

#[test]
fn dataset_export_lands_under_dataset_name() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("HWDB1.1tst_gnt");
    fs::create_dir(&dir).expect("mkdir");
    write_member(&dir, "1241-c.gnt", &['中']);
    let out = temp.path().join("raw");

    cmd()
        .arg("export")
        .arg("--dataset")
        .arg("HWDB1.1tst_gnt")
        .arg("--root")
        .arg(temp.path())
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("HWDB1.1tst_gnt").join("中").join("中_1.png").is_file());
}

#[test]
fn uppercase_gnt_extension_is_accepted() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_member(temp.path(), "1001-C.GNT", &['中']);

    let assert = cmd()
        .arg("inspect")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["samples_total"], 1);

    let assert = cmd()
        .arg("inspect")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["samples_total"], 1);
}
