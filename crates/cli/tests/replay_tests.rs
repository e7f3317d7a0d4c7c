// Integration tests for `gridbase replay` and `gridbase settings`.
// Run with: cargo test -p gridbase-cli --test replay_tests

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const PEOPLE: &str = "name,age\nAnn,30\nBo,\nCy,\n";

fn gridbase() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gridbase"))
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        // Pin the defaults so a user settings file cannot leak in.
        fs::write(dir.path().join("settings.json"), "{}").unwrap();
        Self { dir }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn replay(&self, data: &str, script: &str, extra: &[&str]) -> Output {
        let data = self.write("people.csv", data);
        let script = self.write("script.jsonl", script);
        let settings = self.dir.path().join("settings.json");
        gridbase()
            .arg("replay")
            .arg(&data)
            .arg(&script)
            .arg("--settings")
            .arg(&settings)
            .args(extra)
            .output()
            .expect("run gridbase replay")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn replay_empty_script_echoes_table() {
    let fx = Fixture::new();
    let output = fx.replay(PEOPLE, "", &[]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output), "name\tage\nAnn\t30\nBo\t\nCy\t\n");
}

#[test]
fn replay_type_and_enter_writes_cell() {
    let fx = Fixture::new();
    let script = r#"
{"action": "select", "row": 1, "col": 0}
{"action": "type", "text": "Bob"}
{"action": "key", "combo": "enter"}
"#;
    let output = fx.replay(PEOPLE, script, &[]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output), "name\tage\nAnn\t30\nBob\t\nCy\t\n");
}

#[test]
fn replay_fill_then_undo() {
    let fx = Fixture::new();
    let fill = r#"
{"action": "select", "row": 0, "col": 1}
{"action": "fill", "row": 2, "col": 1}
"#;
    let output = fx.replay(PEOPLE, fill, &[]);
    assert_eq!(stdout(&output), "name\tage\nAnn\t30\nBo\t30\nCy\t30\n");

    let undone = format!("{}{}\n", fill, r#"{"action": "undo"}"#);
    let output = fx.replay(PEOPLE, &undone, &[]);
    assert_eq!(stdout(&output), "name\tage\nAnn\t30\nBo\t\nCy\t\n");
}

#[test]
fn replay_text_in_number_column_clears_cell() {
    let fx = Fixture::new();
    let script = r#"
{"action": "select", "row": 0, "col": 1}
{"action": "type", "text": "old"}
{"action": "commit"}
"#;
    let output = fx.replay(PEOPLE, script, &[]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "name\tage\nAnn\t\nBo\t\nCy\t\n");
}

#[test]
fn replay_copy_paste_through_clipboard() {
    let fx = Fixture::new();
    let script = r#"
{"action": "select", "row": 0, "col": 0}
{"action": "extend", "row": 0, "col": 1}
{"action": "copy"}
{"action": "select", "row": 2, "col": 0}
{"action": "paste"}
"#;
    let output = fx.replay(PEOPLE, script, &["--format", "csv"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output), "name,age\nAnn,30\nBo,\nAnn,30\n");
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[test]
fn replay_structure_changes() {
    let fx = Fixture::new();
    let script = r#"
{"action": "rename_column", "col": 0, "name": "who"}
{"action": "add_column", "name": "total", "number": true}
{"action": "delete_row", "row": 1}
"#;
    let output = fx.replay(PEOPLE, script, &[]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output), "who\tage\ttotal\nAnn\t30\t\nCy\t\t\n");
}

#[test]
fn replay_number_flag_forces_type() {
    let fx = Fixture::new();
    let script = r#"
{"action": "select", "row": 0, "col": 0}
{"action": "type", "text": "7"}
{"action": "commit"}
{"action": "select", "row": 1, "col": 0}
{"action": "type", "text": "seven"}
{"action": "commit"}
"#;
    let output = fx.replay(PEOPLE, script, &["--number", "name"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "name\tage\n7\t30\nBo\t\nCy\t\n");
}

// ---------------------------------------------------------------------------
// Errors and exit codes
// ---------------------------------------------------------------------------

#[test]
fn replay_missing_data_file_is_usage_error() {
    let fx = Fixture::new();
    let script = fx.write("script.jsonl", "");
    let output = gridbase()
        .arg("replay")
        .arg(fx.dir.path().join("nope.csv"))
        .arg(&script)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: cannot read data file"));
}

#[test]
fn replay_bad_script_line_is_usage_error() {
    let fx = Fixture::new();
    let output = fx.replay(PEOPLE, "{\"action\": \"undo\"}\nnot json\n", &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("script line 2"), "{}", stderr);
    assert!(stderr.contains("hint:"), "{}", stderr);
}

#[test]
fn replay_unloaded_cell_is_usage_error() {
    let fx = Fixture::new();
    let output = fx.replay(PEOPLE, r#"{"action": "select", "row": 50, "col": 0}"#, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("action 1"));
}

#[test]
fn settings_prints_json() {
    let fx = Fixture::new();
    let path = fx.write("grid.toml", "\"history.maxSteps\" = 7\n");
    let output = gridbase().arg("settings").arg("--settings").arg(&path).output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(json["history.maxSteps"], 7);
    assert_eq!(json["queue.flushOnCommit"], true);
}
