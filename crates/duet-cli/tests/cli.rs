//! The `duet` binary end to end, isolated from user and project config.

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;

const SETTINGS: &str = "import json\n\nDEFAULT_PATH = \"settings.json\"\n\n\ndef load(path=DEFAULT_PATH):\n    with open(path) as handle:\n        return parse(handle.read())\n\n\ndef parse(text):\n    return json.loads(text)\n";

fn duet(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_duet"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("DUET_LOG")
        .output()
        .unwrap()
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.py"), SETTINGS).unwrap();
    dir
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|e| panic!("{e}: {}", String::from_utf8_lossy(&output.stdout)))
}

#[test]
fn entities_prints_the_graph() {
    let dir = workspace();
    let output = duet(dir.path(), &["entities", "settings.py"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let graph = stdout_json(&output);
    assert_eq!(graph["language"], "python");
    let names: Vec<&str> = graph["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["json", "DEFAULT_PATH", "load", "parse"]);
}

#[test]
fn analyze_with_local_oracle_prints_a_map() {
    let dir = workspace();
    let output = duet(dir.path(), &["analyze", "settings.py", "--trail", "trail/run.jsonl"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let map = stdout_json(&output);
    assert_ne!(map["metadata"]["termination_reason"], "FATAL_ERROR");
    assert!(!map["responsibility_blocks"].as_array().unwrap().is_empty());

    let trail = std::fs::read_to_string(dir.path().join("trail/run.jsonl")).unwrap();
    assert_eq!(
        trail.lines().count(),
        usize::try_from(map["metadata"]["iterations"].as_u64().unwrap()).unwrap()
    );
}

#[test]
fn analyze_history_includes_outcome() {
    let dir = workspace();
    let output = duet(dir.path(), &["--format", "raw", "analyze", "settings.py", "--history"]);
    assert!(output.status.success());

    let response = stdout_json(&output);
    assert!(response["map"].is_object());
    assert!(response["outcome"]["history"].is_array());
}

#[test]
fn unreachable_oracle_exits_two_with_partial_map() {
    let dir = workspace();
    let output = Command::new(env!("CARGO_BIN_EXE_duet"))
        .args(["analyze", "settings.py", "--oracle", "http"])
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("DUET_ORACLE__ENDPOINT", "http://127.0.0.1:9")
        .env("DUET_NEGOTIATION__ORACLE_RETRIES", "0")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let map = stdout_json(&output);
    assert_eq!(map["metadata"]["termination_reason"], "FATAL_ERROR");
    assert!(String::from_utf8_lossy(&output.stderr).contains("duet error: oracle failure"));
}

#[test]
fn missing_file_exits_one() {
    let dir = workspace();
    let output = duet(dir.path(), &["entities", "missing.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("duet error:"));
}

#[test]
fn schema_lists_and_checks() {
    let dir = workspace();
    let output = duet(dir.path(), &["schema"]);
    let names = stdout_json(&output);
    assert!(names.as_array().unwrap().contains(&Value::from("responsibility_map")));

    std::fs::write(dir.path().join("review.json"), r#"{"issues": []}"#).unwrap();
    let output = duet(dir.path(), &["schema", "review_payload", "--check", "review.json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["valid"], true);

    std::fs::write(dir.path().join("bad.json"), r#"{"issues": 3}"#).unwrap();
    let output = duet(dir.path(), &["schema", "review_payload", "--check", "bad.json"]);
    assert_eq!(output.status.code(), Some(1));
}
