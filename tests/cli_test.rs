//! Runs the `apirec` binary against a knowledge base in a temp directory.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_knowledge_base(data: &Path) {
    std::fs::create_dir_all(data).unwrap();
    std::fs::write(data.join("w2v_model.txt"), "2 2\nsort 1.0 0.0\nfile 0.0 1.0\n").unwrap();
    std::fs::write(data.join("idf.json"), r#"{"sort": 2.0, "file": 1.5}"#).unwrap();
    std::fs::write(
        data.join("questions.jsonl"),
        concat!(
            r#"{"id": 1, "title": "sort", "apis": ["java.util.Collections.sort(List)"]}"#,
            "\n",
            r#"{"id": 2, "title": "file", "apis": ["java.io.File.exists()"]}"#,
            "\n",
        ),
    )
    .unwrap();
    std::fs::write(
        data.join("javadoc.jsonl"),
        r#"{"kind": "method", "name": "java.io.File.exists()", "description": "Tests whether the file exists."}"#,
    )
    .unwrap();
}

fn apirec(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_apirec"));
    command.current_dir(dir).env_remove("RUST_LOG");
    command
}

#[test]
fn test_init_then_recommend() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let output = apirec(root).arg("init").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(root.join(".apirec/settings.toml").exists());

    // A second init without --force refuses to overwrite
    let output = apirec(root).arg("init").output().unwrap();
    assert!(!output.status.success());

    write_knowledge_base(&root.join("data"));
    let output = apirec(root)
        .args(["recommend", "file", "-k", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let recs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(recs[0]["full_name"], "java.io.File.exists()");
    assert_eq!(recs[0]["description"], "Tests whether the file exists.");
}

#[test]
fn test_missing_knowledge_base_exits_with_code() {
    let temp_dir = TempDir::new().unwrap();
    let output = apirec(temp_dir.path())
        .args(["recommend", "sort a list"])
        .env("APIREC_DATA__DIR", temp_dir.path().join("nowhere"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ARTIFACT_MISSING"), "{stderr}");
}
