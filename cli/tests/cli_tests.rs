//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("joltgen").expect("binary should exist")
}

fn write(dir: &TempDir, name: &str, value: &Value) -> String {
    let path = dir.path().join(name);
    fs::write(&path, value.to_string()).unwrap();
    path.to_str().unwrap().to_string()
}

fn read(path: &Path) -> Value {
    let content = fs::read_to_string(path).expect("output file should exist");
    serde_json::from_str(&content).expect("output should be valid JSON")
}

fn token_request() -> Value {
    json!({
        "templateName": "SYSTEM_TOKEN",
        "method": "POST",
        "headers": {"Content-Type": "application/x-www-form-urlencoded"},
        "fields": [
            {"path": "grant_type", "storeAttribute": "grant_type", "category": "body",
             "mappingType": "dynamic", "isUrlencoded": true}
        ],
        "response": {"mappings": {"access_token": "TOKEN"}}
    })
}

// ── Generate ────────────────────────────────────────────────────────────────

#[test]
fn test_generate_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "request.json", &token_request());
    let output = dir.path().join("specs.json");

    cmd()
        .args(["generate", &input])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success();

    let specs = read(&output);
    assert_eq!(
        specs["requestSpec"],
        json!([{"operation": "shift", "spec": {"grant_type": "SYSTEM_TOKEN.grant_type"}}])
    );
    assert_eq!(
        specs["formBodySpec"][1]["spec"]["formBody"],
        json!("=concat('grant_type=',@(1,grant_type))")
    );
    assert_eq!(specs["responseSpec"][1]["spec"]["TOKEN"], json!("0"));
}

#[test]
fn test_generate_default_flags() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "request.json", &token_request());
    let output = dir.path().join("specs.json");

    cmd()
        .args(["generate", &input])
        .args(["-o", output.to_str().unwrap()])
        .args(["--default-value", "N/A", "--timestamp", "2026-10-16T09:00:00Z"])
        .arg("--no-response-input")
        .assert()
        .success();

    let specs = read(&output);
    assert_eq!(
        specs["responseSpec"][0]["spec"],
        json!({"access_token": "TOKEN"})
    );
    assert_eq!(
        specs["responseSpec"][1]["spec"],
        json!({
            "success": true,
            "timestamp": "2026-10-16T09:00:00Z",
            "status": "SUCCEEDED",
            "TOKEN": "N/A"
        })
    );
}

#[test]
fn test_generate_timestamp_now() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "request.json", &token_request());

    cmd()
        .args(["generate", &input, "--timestamp", "now", "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#""timestamp":"\d{4}-\d{2}-\d{2}T"#).unwrap());
}

#[test]
fn test_generate_missing_template_name_fails() {
    let dir = TempDir::new().unwrap();
    let mut request = token_request();
    request["templateName"] = json!("");
    let input = write(&dir, "request.json", &request);

    cmd()
        .args(["generate", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Generation failed"));
}

// ── Filter / Enhance ────────────────────────────────────────────────────────

#[test]
fn test_filter_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "ops.json",
        &json!([
            {"operation": "shift", "spec": {"input": {}}},
            {"operation": "default", "spec": {"a": 1}}
        ]),
    );

    cmd()
        .args(["filter", &input, "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"[{"operation":"default","spec":{"a":1}}]"#));
}

#[test]
fn test_enhance_without_auto_default_keeps_ops() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "ops.json",
        &json!([{"operation": "shift", "spec": {"x": "y"}}]),
    );

    cmd()
        .args(["enhance", &input, "--no-auto-default", "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"[{"operation":"shift","spec":{"x":"y"}}]"#));
}

#[test]
fn test_invalid_operation_reports_index() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "ops.json",
        &json!([{"operation": "shift", "spec": {}}, {"operation": "sort"}]),
    );

    cmd()
        .args(["filter", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("index 1"));
}

// ── Error Handling ──────────────────────────────────────────────────────────

#[test]
fn test_missing_input_file() {
    cmd()
        .args(["generate", "/nonexistent/request.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_invalid_json_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.json");
    fs::write(&input, "not json").unwrap();

    cmd()
        .args(["classify", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

#[test]
fn test_help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("enhance"));
}
