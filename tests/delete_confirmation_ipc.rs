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

fn request_raw(
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

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request_raw(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn add_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    no: &str,
    class: &str,
) -> String {
    let res = request_ok(
        stdin,
        reader,
        id,
        "form.submit",
        json!({
            "studentNo": no,
            "fullName": format!("Öğrenci {no}"),
            "gender": "Kız",
            "className": class,
            "score1": 40,
            "score2": 50,
            "score3": 60
        }),
    );
    assert_eq!(res["outcome"], "created");
    res["screen"]["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|r| r["studentNo"] == no)
        .and_then(|r| r["id"].as_str())
        .expect("created row")
        .to_string()
}

fn row_ids(list: &serde_json::Value) -> Vec<String> {
    list["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|r| r["id"].as_str().map(|s| s.to_string()))
        .collect()
}

#[test]
fn delete_needs_a_confirmed_request() {
    let workspace = temp_dir("temrin-delete-gate");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let keep = add_student(&mut stdin, &mut reader, "2", "1", "11-A");
    let gone = add_student(&mut stdin, &mut reader, "3", "2", "11-A");

    let res = request_raw(
        &mut stdin,
        &mut reader,
        "4",
        "students.confirmDelete",
        json!({ "approved": true }),
    );
    assert_eq!(res["ok"], false);
    assert_eq!(res["error"]["code"], "no_pending_delete");

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.requestDelete",
        json!({ "studentId": gone }),
    );
    assert_eq!(res["prompt"], "Bu öğrenciyi silmek istediğinize emin misiniz?");
    let list = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));
    assert_eq!(list["list"]["pendingDelete"], gone.as_str());

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.confirmDelete",
        json!({ "approved": false }),
    );
    assert_eq!(res["outcome"], "declined");
    assert_eq!(row_ids(&res["screen"]).len(), 2);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.requestDelete",
        json!({ "studentId": gone }),
    );
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "students.confirmDelete",
        json!({ "approved": true }),
    );
    assert_eq!(res["outcome"], "deleted");
    assert_eq!(row_ids(&res["screen"]), vec![keep]);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn delete_of_unknown_id_reports_failure_on_list() {
    let workspace = temp_dir("temrin-delete-missing");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = add_student(&mut stdin, &mut reader, "2", "1", "11-A");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.requestDelete",
        json!({ "studentId": "no-such-id" }),
    );
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.confirmDelete",
        json!({ "approved": true }),
    );
    assert_eq!(res["outcome"], "failed");
    assert_eq!(res["screen"]["error"]["code"], "persistence_error");
    assert_eq!(row_ids(&res["screen"]).len(), 1);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
