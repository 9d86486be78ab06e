//! End-to-end tests for the ferry binary
//!
//! These tests run the real binary against files in a temporary directory:
//! - Import with text and JSON reports
//! - Media resolution failures
//! - Reruns with and without --purge
//! - Configuration checks and usage errors

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const PIPELINE: &str = r#"
[source]
format = "auto"

[[entities]]
name = "blog.category"
tag = "category"
fields.title = { kind = "text", required = true }
candidates = [{ name = "v1" }]

[[entities]]
name = "blog.post"
tag = "post"

[entities.fields]
title = { kind = "text", required = true, max_length = 40 }
category = { kind = "reference", entity = "blog.category", required = true }
cover = { kind = "file" }

[[entities.candidates]]
name = "v2"
steps = [{ op = "require", fields = ["title"] }, { op = "file", field = "cover" }]

[[entities.candidates]]
name = "v1"
ignore_missing = ["cover"]
steps = [{ op = "rename", from = "headline", to = "title" }]
"#;

const DUMP: &str = r#"[
    {"model": "category", "pk": 1, "fields": {"title": "News"}},
    {"model": "post", "pk": 1, "fields": {"title": "Hello", "category": 1, "cover": "covers/hello.png"}},
    {"model": "post", "pk": 2, "fields": {"title": "Again", "category": 1, "cover": "covers/again.png"}}
]"#;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Workspace with a pipeline, a source dump and a media root holding both covers
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ferry.toml", PIPELINE);
    write(dir.path(), "blog.json", DUMP);
    write(dir.path(), "media/covers/hello.png", "hello");
    write(dir.path(), "media/covers/again.png", "again");
    dir
}

fn ferry(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ferry").unwrap();
    cmd.current_dir(dir)
        .env_remove("FERRY_CONFIG")
        .env_remove("FERRY_MEDIA_ROOT")
        .env_remove("FERRY_OUTPUT_DIR")
        .env_remove("FERRY_LOG_LEVEL")
        .env("NO_COLOR", "1");
    cmd
}

// ============================================================================
// Import Tests
// ============================================================================

#[test]
fn test_import_success() {
    let dir = workspace();

    ferry(dir.path())
        .args(["import", "blog.json", "--media", "media"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Import Report"))
        .stdout(predicate::str::contains("blog.post"))
        .stdout(predicate::str::contains("3 committed, 0 skipped, 0 failed"));

    let posts = std::fs::read_to_string(dir.path().join("ferry-data/blog.post.jsonl")).unwrap();
    assert_eq!(posts.lines().count(), 2);
    assert!(posts.contains("covers/hello.png"));
}

#[test]
fn test_import_json_report() {
    let dir = workspace();

    let output = ferry(dir.path())
        .args(["import", "blog.json", "--media", "media", "--report", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["loaders"][0]["entity"], "blog.category");
    assert_eq!(report["loaders"][1]["candidate"], "v2");
    assert_eq!(report["loaders"][1]["outcomes"][1]["status"], "committed");
}

#[test]
fn test_import_missing_media_file() {
    let dir = workspace();
    std::fs::remove_file(dir.path().join("media/covers/again.png")).unwrap();

    ferry(dir.path())
        .args(["import", "blog.json", "--media", "media"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Failures:"))
        .stdout(predicate::str::contains("blog.post record 2 (pk 2): media error: file not found"))
        .stdout(predicate::str::contains("2 committed, 0 skipped, 1 failed"));
}

#[test]
fn test_import_media_root_from_environment() {
    let dir = workspace();

    ferry(dir.path())
        .args(["import", "blog.json"])
        .env("FERRY_MEDIA_ROOT", dir.path().join("media"))
        .assert()
        .success();
}

#[test]
fn test_import_malformed_source() {
    let dir = workspace();
    write(dir.path(), "broken.json", r#"[{"model": "post", "pk": 1}]"#);

    ferry(dir.path())
        .args(["import", "broken.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Cannot read source"))
        .stderr(predicate::str::contains("Expected mapping with keys"));
}

#[test]
fn test_import_missing_source() {
    let dir = workspace();

    ferry(dir.path())
        .args(["import", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found: 'nope.json'"));
}

#[test]
fn test_rerun_requires_purge() {
    let dir = workspace();

    ferry(dir.path())
        .args(["import", "blog.json", "--media", "media"])
        .assert()
        .success();

    // Every key is already stored.
    ferry(dir.path())
        .args(["import", "blog.json", "--media", "media"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("0 committed, 0 skipped, 3 failed"));

    ferry(dir.path())
        .args(["import", "blog.json", "--media", "media", "--purge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 committed"));

    let posts = std::fs::read_to_string(dir.path().join("ferry-data/blog.post.jsonl")).unwrap();
    assert_eq!(posts.lines().count(), 2);
}

#[test]
fn test_import_jsonl_with_format_override() {
    let dir = workspace();
    write(
        dir.path(),
        "blog.dump",
        concat!(
            "{\"model\": \"category\", \"pk\": 1, \"title\": \"News\"}\n",
            "{\"model\": \"post\", \"pk\": 1, \"headline\": \"Hello\", \"category\": 1}\n",
        ),
    );

    ferry(dir.path())
        .args(["import", "blog.dump", "--format", "jsonl", "--output", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1"));

    assert!(dir.path().join("out/blog.post.jsonl").is_file());
}

// ============================================================================
// Check Tests
// ============================================================================

#[test]
fn test_check_lists_loaders() {
    let dir = workspace();

    ferry(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline OK"))
        .stdout(predicate::str::contains("blog.category"))
        .stdout(predicate::str::contains("v2 -> v1"));
}

#[test]
fn test_check_unknown_reference() {
    let dir = workspace();
    write(
        dir.path(),
        "bad.toml",
        r#"
        [[entities]]
        name = "blog.post"
        fields.category = { kind = "reference", entity = "blog.category" }
        candidates = [{ name = "v1" }]
        "#,
    );

    ferry(dir.path())
        .args(["check", "--config", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undeclared entity 'blog.category'"));
}

#[test]
fn test_no_arguments_prints_help() {
    Command::cargo_bin("ferry")
        .unwrap()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}
