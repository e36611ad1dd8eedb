use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("relic")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn validate_matches_and_mismatches() {
    let td = tempfile::tempdir().unwrap();
    let f = td.path().join("hello.txt");
    fs::write(&f, b"hello world").unwrap();

    Command::cargo_bin("relic")
        .unwrap()
        .args(["validate", f.to_str().unwrap(), HELLO_SHA1])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));

    Command::cargo_bin("relic")
        .unwrap()
        .args(["validate", f.to_str().unwrap(), "feedbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mismatch"));
}

#[test]
fn check_against_cached_index_is_offline() {
    let td = tempfile::tempdir().unwrap();
    let indexes = td.path().join("assets/indexes");
    fs::create_dir_all(&indexes).unwrap();
    fs::write(
        indexes.join("1.19.json"),
        format!(r#"{{"objects":{{"a.txt":{{"hash":"{HELLO_SHA1}","size":11}}}}}}"#),
    )
    .unwrap();

    // No index url: the cached copy is used, and the single missing
    // object shows up in the plan.
    Command::cargo_bin("relic")
        .unwrap()
        .args([
            "check",
            "--root",
            td.path().to_str().unwrap(),
            "--asset-id",
            "1.19",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains(HELLO_SHA1));
}

#[test]
fn check_json_emits_machine_readable_plan() {
    let td = tempfile::tempdir().unwrap();
    let indexes = td.path().join("assets/indexes");
    fs::create_dir_all(&indexes).unwrap();
    fs::write(
        indexes.join("1.19.json"),
        format!(r#"{{"objects":{{"a.txt":{{"hash":"{HELLO_SHA1}","size":11}}}}}}"#),
    )
    .unwrap();

    let out = Command::cargo_bin("relic")
        .unwrap()
        .args([
            "check",
            "--root",
            td.path().to_str().unwrap(),
            "--asset-id",
            "1.19",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let plan: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(plan.as_array().unwrap().len(), 1);
    assert_eq!(plan[0]["name"], "a.txt");
    assert_eq!(plan[0]["kind"], "resource");
}

#[test]
fn index_summary_reports_counts() {
    let td = tempfile::tempdir().unwrap();
    let indexes = td.path().join("assets/indexes");
    fs::create_dir_all(&indexes).unwrap();
    fs::write(
        indexes.join("1.19.json"),
        format!(
            r#"{{"virtual":true,"objects":{{"a.txt":{{"hash":"{HELLO_SHA1}","size":11}}}}}}"#
        ),
    )
    .unwrap();

    Command::cargo_bin("relic")
        .unwrap()
        .args([
            "index",
            "--root",
            td.path().to_str().unwrap(),
            "--asset-id",
            "1.19",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("objects=1"))
        .stdout(predicate::str::contains("virtual=true"));
}
