use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_temrind");
    let mut child = Command::new(exe)
        .env_remove("TEMRIND_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn temrind");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        assert_ne!(
            error_code(&value),
            Some("not_implemented"),
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("temrin-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["result"]["workspacePath"], serde_json::Value::Null);

    // Everything but health/workspace needs an open workspace.
    let early = request(&mut stdin, &mut reader, "2", "view.get", json!({}));
    assert_eq!(error_code(&early), Some("no_workspace"));

    let selected = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["ok"], true);

    let view = request(&mut stdin, &mut reader, "4", "view.get", json!({}));
    assert_eq!(view["result"]["view"], "dashboard");
    assert_eq!(view["result"]["loading"], false);
    assert_eq!(view["result"]["classFilter"], "all");

    let _ = request(&mut stdin, &mut reader, "5", "dashboard.get", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "dashboard.setClassFilter",
        json!({ "className": "11-A" }),
    );
    let _ = request(&mut stdin, &mut reader, "7", "students.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "view.navigate",
        json!({ "view": "form" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "form.submit",
        json!({
            "studentNo": "1",
            "fullName": "Smoke Öğrenci",
            "gender": "Erkek",
            "className": "11-A",
            "score1": 50,
            "score2": 60,
            "score3": 70
        }),
    );
    let _ = request(&mut stdin, &mut reader, "10", "form.cancel", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "students.requestDelete",
        json!({ "studentId": "missing" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "students.confirmDelete",
        json!({ "approved": false }),
    );

    let unknown = send(&mut stdin, &mut reader, "13", "grades.explode", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    let closed = request(&mut stdin, &mut reader, "14", "workspace.close", json!({}));
    assert_eq!(closed["result"]["closed"], true);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unparsable_line_answers_bad_json_and_keeps_serving() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(value["ok"], false);
    assert_eq!(error_code(&value), Some("bad_json"));

    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health["ok"], true);

    drop(stdin);
    let _ = child.wait();
}
