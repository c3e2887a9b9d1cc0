//! End-to-end tests for the Drift compiler CLI.
//!
//! Each test writes a `.drift` source file, invokes the real `driftc`
//! binary, and asserts on exit status and output.

use std::path::PathBuf;
use std::process::{Command, Output};

fn driftc() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_driftc"))
}

fn write_source(dir: &tempfile::TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).expect("failed to write source file");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(driftc())
        .args(args)
        .output()
        .expect("failed to invoke driftc")
}

#[test]
fn build_minimal_script_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(
        &dir,
        "test.drift",
        "name test; int x = 5; begin gamemode { x = x + 1; }",
    );
    let out = run(&["build", src.to_str().unwrap(), "--no-color"]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Compiled: test"), "{stderr}");
    assert!(stderr.contains("1 var(s)"), "{stderr}");
}

#[test]
fn build_writes_bytecode_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(&dir, "test.drift", "name test; begin gamemode { }");
    let out_path = dir.path().join("test.bin");
    let out = run(&[
        "build",
        src.to_str().unwrap(),
        "--output",
        out_path.to_str().unwrap(),
        "--no-color",
    ]);
    assert!(out.status.success());
    let bytes = std::fs::read(&out_path).expect("bytecode file written");
    // Script-name statement opens the stream.
    assert_eq!(&bytes[..4], &[0x1D, 0x00, 0x00, 0x00]);
}

#[test]
fn type_errors_fail_the_build_with_rendered_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(
        &dir,
        "bad.drift",
        "name bad; string s; array a; begin gamemode { s = \"x\" + a; }",
    );
    let out = run(&["build", src.to_str().unwrap(), "--no-color"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("E0001"), "{stderr}");
    assert!(stderr.contains("operator `+`"), "{stderr}");
}

#[test]
fn syntax_errors_report_every_statement() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(
        &dir,
        "bad.drift",
        "name bad; begin gamemode { int x = ; int y = + ; }",
    );
    let out = run(&["build", src.to_str().unwrap(), "--no-color"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.matches("expected an expression").count() >= 2,
        "{stderr}"
    );
}

#[test]
fn json_diagnostics_are_line_delimited() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(
        &dir,
        "bad.drift",
        "name bad; begin gamemode { break; }",
    );
    let out = run(&["build", src.to_str().unwrap(), "--json"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    let diagnostic = stderr
        .lines()
        .find(|line| line.starts_with('{'))
        .expect("a JSON diagnostic line");
    let value: serde_json::Value = serde_json::from_str(diagnostic).expect("valid JSON");
    assert_eq!(value["severity"], "error");
    assert!(value["message"]
        .as_str()
        .unwrap()
        .contains("`break` outside of a loop"));
}

#[test]
fn extended_command_table_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("table.json");
    std::fs::write(
        &table,
        serde_json::json!([{
            "name": "BlinkLights",
            "opcode": 0x2100,
            "params": [{"name": "count", "kind": "Integer", "optional": false}],
            "ret": "Nothing",
            "convention": "Default",
            "origin": "lights-extender"
        }])
        .to_string(),
    )
    .unwrap();
    let src = write_source(
        &dir,
        "lights.drift",
        "name lights; begin gamemode { BlinkLights(3); }",
    );
    let out = run(&[
        "build",
        src.to_str().unwrap(),
        "--table",
        table.to_str().unwrap(),
        "--no-color",
    ]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("lights-extender"), "{stderr}");
}

#[test]
fn form_map_from_json_enables_member_access() {
    let dir = tempfile::tempdir().unwrap();
    let forms = dir.path().join("forms.json");
    std::fs::write(
        &forms,
        serde_json::json!([{
            "edid": "MyQuest",
            "form_id": 0x12345,
            "kind": "quest",
            "script_vars": [{"name": "counter", "kind": "int", "index": 1}]
        }])
        .to_string(),
    )
    .unwrap();
    let src = write_source(
        &dir,
        "quests.drift",
        "name quests; int n; begin gamemode { n = MyQuest.counter; }",
    );
    let out = run(&[
        "build",
        src.to_str().unwrap(),
        "--forms",
        forms.to_str().unwrap(),
        "--no-color",
    ]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn shadowing_notice_does_not_fail_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let forms = dir.path().join("forms.json");
    std::fs::write(
        &forms,
        serde_json::json!([{
            "edid": "counter",
            "form_id": 0x9999,
            "kind": "global",
            "script_vars": []
        }])
        .to_string(),
    )
    .unwrap();
    let src = write_source(
        &dir,
        "shadow.drift",
        "name shadow; int counter; begin gamemode { counter = 1; }",
    );
    let out = run(&[
        "build",
        src.to_str().unwrap(),
        "--forms",
        forms.to_str().unwrap(),
        "--no-color",
    ]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("shadows"), "{stderr}");
}

#[test]
fn dump_prints_hex() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(&dir, "test.drift", "name test; begin gamemode { }");
    let out = run(&["build", src.to_str().unwrap(), "--dump", "--no-color"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("00000000  1d 00 00 00"), "{stdout}");
}

#[test]
fn ast_subcommand_prints_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(
        &dir,
        "test.drift",
        "name test; int x = 5; begin gamemode { x = x + 1; }",
    );
    let out = run(&["ast", src.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Script test"), "{stdout}");
    assert!(stdout.contains("Begin gamemode"), "{stdout}");
    assert!(stdout.contains("Binary +"), "{stdout}");
}

#[test]
fn missing_file_is_a_clean_error() {
    let out = run(&["build", "/no/such/file.drift"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to read"), "{stderr}");
}
