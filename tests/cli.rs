use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Command isolated from the user's settings and environment
fn navbuddy(project: &Path, state: &Path) -> Command {
    let mut cmd = Command::cargo_bin("navbuddy").unwrap();
    cmd.env_remove("NAVBUDDY_API_KEY")
        .env_remove("RUST_LOG")
        .arg("--path")
        .arg(project)
        .arg("--state")
        .arg(state);
    cmd
}

#[test]
fn test_link_reads_stdin() {
    let tmp = tempdir().unwrap();

    navbuddy(tmp.path(), &tmp.path().join("state.db"))
        .arg("link")
        .write_stdin("see utils/helpers.go:42 for details\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "see [utils/helpers.go:42](command:navbuddy.openFile?",
        ))
        .stdout(predicate::str::ends_with(" for details\n"));
}

#[test]
fn test_link_reads_file() {
    let tmp = tempdir().unwrap();
    write(tmp.path(), "notes.md", "check module.py (line 7)\n");

    navbuddy(tmp.path(), &tmp.path().join("state.db"))
        .arg("link")
        .arg(tmp.path().join("notes.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[module.py:7](command:navbuddy.openFile?"));
}

#[test]
fn test_comments_json() {
    let tmp = tempdir().unwrap();
    let project = tmp.path().join("project");
    write(
        &project,
        "src/auth.ts",
        "import x from 'y';\n\n// TODO: fix auth bug\nexport {};\n",
    );
    write(&project, "src/other.ts", "/* unrelated */\n");
    write(&project, "node_modules/dep/index.js", "// vendored\n");

    let assert = navbuddy(&project, &tmp.path().join("state.db"))
        .args(["--format", "json", "comments"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();
    let records = json.as_array().unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["file"], "src/auth.ts");
    assert_eq!(records[0]["line_number"], 3);
    assert_eq!(records[0]["text"], "TODO: fix auth bug");
    assert_eq!(records[1]["text"], "unrelated");
}

#[test]
fn test_folder_selection_persists() {
    let tmp = tempdir().unwrap();
    let project = tmp.path().join("project");
    let state = tmp.path().join("state.db");
    write(&project, "src/a.ts", "// in src\n");
    write(&project, "web/b.ts", "// in web\n");

    navbuddy(&project, &state)
        .args(["folders", "--set", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected 1 folder(s)"));

    let assert = navbuddy(&project, &state)
        .args(["-o", "json", "folders"])
        .assert()
        .success();
    let json: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["selected"], serde_json::json!(["src"]));
    assert_eq!(json["directories"], serde_json::json!(["", "src", "web"]));

    navbuddy(&project, &state)
        .arg("comments")
        .assert()
        .success()
        .stdout(predicate::str::contains("in src"))
        .stdout(predicate::str::contains("in web").not());
}

#[test]
fn test_set_key_rejects_empty_input() {
    let tmp = tempdir().unwrap();

    navbuddy(tmp.path(), &tmp.path().join("state.db"))
        .arg("set-key")
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key must not be empty"));
}

#[test]
fn test_find_without_key_fails_before_scanning() {
    let tmp = tempdir().unwrap();
    let project = tmp.path().join("project");
    write(&project, "a.ts", "// hello\n");

    navbuddy(&project, &tmp.path().join("state.db"))
        .args(["find", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is not set"))
        .stderr(predicate::str::contains("Scanning").not());
}

#[test]
fn test_open_prints_clamped_location() {
    let tmp = tempdir().unwrap();
    let project = tmp.path().join("project");
    write(&project, "src/app.ts", "one\ntwo\nthree\n");

    navbuddy(&project, &tmp.path().join("state.db"))
        .args(["open", "app.ts:40"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("src/app.ts:3\n"))
        .stdout(predicate::str::contains("3 | three"));
}

#[test]
fn test_open_missing_file() {
    let tmp = tempdir().unwrap();

    navbuddy(tmp.path(), &tmp.path().join("state.db"))
        .args(["open", "ghost.ts:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found: ghost.ts"));
}
