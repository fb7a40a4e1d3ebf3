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
fn roster_export_then_import_reproduces_tuples() {
    let src_ws = temp_dir("gradebook-roster-src");
    let dst_ws = temp_dir("gradebook-roster-dst");
    let csv_path = src_ws.join("roster.csv");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": src_ws.to_string_lossy() }),
    );
    let people = [
        json!({ "name": "Doe, Jane", "studentId": "S-001", "classSections": ["Math 7", "Sci 8"] }),
        json!({ "name": "Tom \"TJ\" Lee", "classSections": [] }),
        json!({ "name": "Cleo", "studentId": "S-003", "classSections": ["Sci 8"] }),
    ];
    for (i, p) in people.iter().enumerate() {
        let _ = request_ok(&mut stdin, &mut reader, &format!("s{}", i), "students.upsert", p.clone());
    }
    let unexportable = [
        json!({ "name": "Ada", "classSections": ["Math 7; Period 2"] }),
        json!({ "name": "Ben\nJr", "studentId": "S-002", "classSections": ["Sci"] }),
    ];
    for (i, p) in unexportable.into_iter().enumerate() {
        assert_eq!(
            request_err(&mut stdin, &mut reader, &format!("bad{}", i), "students.upsert", p),
            "bad_params"
        );
    }
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.exportCsv",
        json!({ "outPath": csv_path.to_string_lossy() }),
    );
    assert_eq!(exported["count"], 3);
    let csv = exported["csv"].as_str().expect("csv").to_string();
    assert!(csv.starts_with("Name,ID,Class Sections\n"));
    assert!(csv.contains(r#""Tom ""TJ"" Lee","","""#));
    assert_eq!(std::fs::read_to_string(&csv_path).expect("read csv"), csv);

    let before = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({ "path": dst_ws.to_string_lossy() }),
    );
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.importCsv",
        json!({ "path": csv_path.to_string_lossy() }),
    );
    assert_eq!(imported["imported"], 3);
    assert_eq!(imported["warnings"], json!([]));
    let after = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));

    let tuples = |v: &serde_json::Value| -> Vec<(String, Option<String>, serde_json::Value)> {
        v["students"]
            .as_array()
            .expect("students")
            .iter()
            .map(|s| {
                (
                    s["name"].as_str().unwrap_or("").to_string(),
                    s.get("studentId").and_then(|x| x.as_str()).map(str::to_string),
                    s["classSections"].clone(),
                )
            })
            .collect()
    };
    assert_eq!(tuples(&before), tuples(&after));

    let sci = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "classSection": "Sci 8", "search": "CLEO" }),
    );
    assert_eq!(sci["students"].as_array().map(|a| a.len()), Some(1));
    let sections = request_ok(&mut stdin, &mut reader, "8", "students.sections", json!({}));
    assert_eq!(sections["sections"], json!(["Math 7", "Sci 8"]));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(src_ws);
    let _ = std::fs::remove_dir_all(dst_ws);
}

#[test]
fn import_appends_and_reports_rows_without_a_name() {
    let workspace = temp_dir("gradebook-roster-warnings");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let text = "Name,ID,Class Sections\nAda,S1,Math 7\n,S2,Math 7\n\nBen,,Sci 8; Math 7\n";
    for round in 0..2 {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("import{}", round),
            "students.importCsv",
            json!({ "text": text }),
        );
        assert_eq!(res["imported"], 2);
        assert_eq!(res["warnings"][0]["line"], 3);
        assert_eq!(res["warnings"][0]["code"], "missing_name");
    }
    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(listed["total"], 4);
    assert_eq!(listed["students"][1]["classSections"], json!(["Sci 8", "Math 7"]));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
