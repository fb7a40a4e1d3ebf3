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
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
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
    let value = request(stdin, reader, id, method, params);
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

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("gradebook-router-smoke");
    let bundle_out = workspace.join("smoke-state.zip");
    let csv_out = workspace.join("smoke-roster.csv");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health["version"].as_str().is_some());
    assert!(health["workspacePath"].is_null());

    assert_eq!(
        request_err(&mut stdin, &mut reader, "2", "students.list", json!({})),
        "no_workspace"
    );
    assert_eq!(
        request_err(&mut stdin, &mut reader, "3", "nope.method", json!({})),
        "not_implemented"
    );

    // Garbage line: answered without an id, loop keeps going.
    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json response");
    let bad: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(bad["error"]["code"], "bad_json");

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["workspacePath"], json!(workspace.to_string_lossy()));
    assert!(workspace.join("gradebook.sqlite3").is_file());

    let calls: Vec<(&str, serde_json::Value)> = vec![
        ("schedule.get", json!({})),
        ("schedule.save", json!({ "cycleLength": 6, "startDate": "2024-09-03" })),
        ("schedule.addClass", json!({ "day": 1, "className": "Math 7" })),
        ("schedule.classPeriods", json!({})),
        ("schedule.cycleDay", json!({ "date": "2024-09-10" })),
        ("holidays.add", json!({ "date": "2024-10-14" })),
        ("holidays.list", json!({})),
        ("holidays.import", json!({ "text": "Date\n2024-12-25\n", "format": "csv", "mode": "merge" })),
        ("holidays.remove", json!({ "date": "2024-12-25" })),
        ("calendar.month", json!({ "year": 2024, "month": 9 })),
        ("calendar.week", json!({ "date": "2024-09-10" })),
        ("view.get", json!({})),
        ("view.navigate", json!({ "action": "next" })),
        ("view.setMode", json!({ "mode": "week" })),
        ("view.selectAssignment", json!({ "assignmentId": null })),
        ("students.upsert", json!({ "name": "Ada", "classSections": ["Math 7"] })),
        ("students.list", json!({ "search": "ad" })),
        ("students.sections", json!({})),
        ("students.exportCsv", json!({ "outPath": csv_out.to_string_lossy() })),
        ("students.importCsv", json!({ "text": "Name,ID,Class Sections\nBen,,\n" })),
        ("curriculum.subjects", json!({})),
        ("curriculum.grade", json!({ "subject": "History and Citizenship Education", "grade": "Secondary 3" })),
        ("rubrics.list", json!({})),
        ("assignments.list", json!({})),
        ("grades.studentSummary", json!({})),
        ("backup.exportBundle", json!({ "outPath": bundle_out.to_string_lossy() })),
        ("backup.importBundle", json!({ "inPath": bundle_out.to_string_lossy() })),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("call-{}", i);
        let _ = request_ok(&mut stdin, &mut reader, &id, method, params);
    }
    assert!(csv_out.is_file());
    assert!(bundle_out.is_file());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
