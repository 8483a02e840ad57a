use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn shelf_command(root: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_novelshelf"));
    command
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(root.join(".novelshelf/library.sqlite"))
        .arg("--config")
        .arg(root.join("config.toml"));
    command
}

fn run_shelf(root: &Path, args: &[&str]) -> Output {
    shelf_command(root)
        .args(args)
        .output()
        .expect("novelshelf command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

const PAYLOAD: &str = r#"{
  "book": {"id": "kiem-lai", "title": "Kiếm Lai", "authorName": "Phong Hỏa Hí Chư Hầu"},
  "chapters": [
    {"selfId": "chuong-3", "title": "Chương 3", "body": "ba", "declaredPrevId": "chuong-2"},
    {"selfId": "chuong-1", "title": "Chương 1", "body": "một", "declaredNextId": "chuong-2"},
    {"selfId": "chuong-2", "title": "Chương 2", "body": "hai", "declaredNextId": "Chương 3", "declaredPrevId": "chuong-1"}
  ]
}"#;

fn write_payload(root: &Path) -> String {
    let path = root.join("book.json");
    std::fs::write(&path, PAYLOAD).expect("payload should be writable");
    path.display().to_string()
}

#[test]
fn reading_flow_dispatches_through_every_command() {
    let root = unique_workspace("novelshelf-cli-dispatch");
    let payload = write_payload(&root);

    let order = run_shelf(&root, &["order", &payload, "--json"]);
    assert_success(&order);
    let order = parse_json(&order);
    assert_eq!(order["order"], serde_json::json!(["chuong-1", "chuong-2", "chuong-3"]));
    assert!(!root.join(".novelshelf/library.sqlite").exists());

    let import = run_shelf(&root, &["import", &payload, "--json"]);
    assert_success(&import);
    let import = parse_json(&import);
    assert_eq!(import["inserted"], 3);
    assert_eq!(import["head_rule"], "no_prev_pointer");

    let chapters = run_shelf(&root, &["chapters", "kiem-lai", "--json"]);
    assert_success(&chapters);
    let ids = parse_json(&chapters)
        .as_array()
        .expect("chapters should be an array")
        .iter()
        .map(|row| row["id"].as_str().expect("id").to_string())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["chuong-1", "chuong-2", "chuong-3"]);

    assert_failure(&run_shelf(&root, &["next", "kiem-lai"]));
    assert_success(&run_shelf(&root, &["goto", "kiem-lai", "chuong-2"]));

    let next = run_shelf(&root, &["next", "kiem-lai", "--json"]);
    assert_success(&next);
    let next = parse_json(&next);
    assert_eq!(next["moved"], true);
    assert_eq!(next["chapter"]["selfId"], "chuong-3");

    let prev = run_shelf(&root, &["prev", "kiem-lai", "--json"]);
    assert_success(&prev);
    assert_eq!(parse_json(&prev)["chapter"]["selfId"], "chuong-2");

    let position = run_shelf(&root, &["position", "kiem-lai", "--json"]);
    assert_success(&position);
    assert_eq!(parse_json(&position)["chapterId"], "chuong-2");

    assert_success(&run_shelf(
        &root,
        &["summary", "kiem-lai", "chuong-1", "Mở đầu câu chuyện."],
    ));
    assert_success(&run_shelf(&root, &["import", &payload]));
    let chapter = run_shelf(&root, &["chapter", "kiem-lai", "chuong-1", "--json"]);
    assert_success(&chapter);
    assert_eq!(parse_json(&chapter)["summary"], "Mở đầu câu chuyện.");

    let history = run_shelf(&root, &["history", "kiem-lai", "--json"]);
    assert_success(&history);
    assert_eq!(parse_json(&history).as_array().map(Vec::len), Some(2));

    assert_success(&run_shelf(&root, &["complete", "kiem-lai"]));
    let books = run_shelf(&root, &["books", "--json"]);
    assert_success(&books);
    let books = parse_json(&books);
    assert_eq!(books[0]["id"], "kiem-lai");
    assert!(books[0]["completedAt"].is_string());

    assert_success(&run_shelf(&root, &["remove", "kiem-lai"]));
    assert_failure(&run_shelf(&root, &["show", "kiem-lai"]));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn import_reads_stdin_and_rejects_malformed_payloads() {
    let root = unique_workspace("novelshelf-cli-stdin");

    let mut child = shelf_command(&root)
        .args(["import", "-", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("novelshelf should spawn");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(PAYLOAD.as_bytes())
        .expect("payload should be written to stdin");
    let output = child.wait_with_output().expect("import should finish");
    assert_success(&output);
    assert_eq!(parse_json(&output)["book_id"], "kiem-lai");

    let bad = root.join("bad.json");
    std::fs::write(&bad, "{\"book\": {\"id\": \"\"}}").expect("bad payload should write");
    let output = run_shelf(&root, &["import", bad.to_str().expect("utf8 path")]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed import"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn canon_and_config_labels() {
    let root = unique_workspace("novelshelf-cli-config");

    let canon = run_shelf(&root, &["canon", "Chương 12: Đêm Trăng"]);
    assert_success(&canon);
    assert_eq!(String::from_utf8_lossy(&canon.stdout).trim(), "chuong-12-dem-trang");

    std::fs::write(root.join("config.toml"), "[numbering]\nlabels = [\"hồi\"]\n")
        .expect("config should write");
    let payload = root.join("hoi.json");
    std::fs::write(
        &payload,
        r#"{"book": {"id": "tam-quoc"},
            "chapters": [
              {"selfId": "x", "title": "Hồi 3", "declaredPrevId": "Hồi 2"},
              {"selfId": "y", "title": "Hồi 1", "declaredNextId": "Hồi 2"},
              {"selfId": "z", "title": "Hồi 2", "declaredNextId": "Hồi 3", "declaredPrevId": "Hồi 1"}
            ]}"#,
    )
    .expect("payload should write");
    let order = run_shelf(
        &root,
        &["order", payload.to_str().expect("utf8 path"), "--json"],
    );
    assert_success(&order);
    assert_eq!(parse_json(&order)["order"], serde_json::json!(["y", "z", "x"]));

    std::fs::write(root.join("config.toml"), "[numbering\n").expect("config should write");
    assert_failure(&run_shelf(&root, &["books"]));

    let _ = std::fs::remove_dir_all(root);
}
