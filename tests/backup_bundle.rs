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
fn state_bundle_roundtrip_into_a_fresh_workspace() {
    let src_ws = temp_dir("gradebook-bundle-src");
    let dst_ws = temp_dir("gradebook-bundle-dst");
    let bundle = src_ws.join("exports").join("state.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": src_ws.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "schedule.save",
        json!({ "cycleLength": 5, "startDate": "2024-09-03" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "3", "holidays.add", json!({ "date": "2024-10-14" }));
    let _ = request_ok(&mut stdin, &mut reader, "4", "students.upsert", json!({ "name": "Ada" }));
    let rubric = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "rubrics.upsert",
        json!({ "title": "Quiz", "criteria": [{ "name": "A" }], "numLevels": 4 }),
    );
    let rubric_id = rubric["rubric"]["id"].as_str().expect("id").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "assignments.create",
        json!({ "rubricId": rubric_id, "dueDate": "2024-09-12" }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "backup.exportBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"], "gradebook-state-v1");
    assert_eq!(exported["entryCount"], 2);

    let f = std::fs::File::open(&bundle).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("zip archive");
    let mut manifest = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("manifest.json").expect("manifest entry"),
        &mut manifest,
    )
    .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["format"], "gradebook-state-v1");
    assert_eq!(manifest["sha256"], exported["sha256"]);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "workspace.select",
        json!({ "path": dst_ws.to_string_lossy() }),
    );
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "backup.importBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"], "gradebook-state-v1");
    assert_eq!(imported["students"], 1);

    let schedule = request_ok(&mut stdin, &mut reader, "10", "schedule.get", json!({}));
    assert_eq!(schedule["schedule"]["cycleLength"], 5);
    assert_eq!(schedule["schedule"]["holidays"], json!(["2024-10-14"]));
    let assignments = request_ok(&mut stdin, &mut reader, "11", "assignments.list", json!({}));
    assert_eq!(assignments["assignments"][0]["rubricTitle"], "Quiz");

    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "12",
            "backup.importBundle",
            json!({ "inPath": dst_ws.join("missing.zip").to_string_lossy() })
        ),
        "not_found"
    );
    let junk = dst_ws.join("junk.zip");
    std::fs::write(&junk, b"not a zip").expect("write junk");
    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "13",
            "backup.importBundle",
            json!({ "inPath": junk.to_string_lossy() })
        ),
        "backup_failed"
    );
    // A failed import leaves the current state alone.
    let students = request_ok(&mut stdin, &mut reader, "14", "students.list", json!({}));
    assert_eq!(students["total"], 1);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(src_ws);
    let _ = std::fs::remove_dir_all(dst_ws);
}

#[test]
fn browser_storage_dump_replaces_all_collections() {
    let workspace = temp_dir("gradebook-browser-import");
    let dump_path = workspace.join("localStorage.json");
    let dump = json!({
        "scheduleConfig": "{\"cycleLength\":6,\"startDate\":\"2024-09-03\",\"classSchedule\":{\"1\":[\"Math 7\"]},\"holidays\":[\"2024-10-14\"]}",
        "students": "[{\"id\":\"1725000000000\",\"name\":\"Ada\",\"studentId\":\"\",\"classSections\":[\"Math 7\"],\"dateAdded\":\"2024-09-01T12:00:00.000Z\"}]",
        "savedRubrics": "[{\"id\":\"1725000000001\",\"title\":\"Essay\",\"criteria\":[\"Thesis\",\"Evidence\"],\"numLevels\":4,\"levelNames\":[\"1\",\"2\",\"3\",\"4\"],\"curriculum\":{\"subject\":\"\"},\"dateCreated\":\"2024-09-01T12:00:00.000Z\"}]",
        "assignments": "[{\"id\":\"1725000000002\",\"rubricId\":\"1725000000001\",\"rubricTitle\":\"Essay\",\"dueDate\":\"2024-09-12\",\"classPeriod\":\"Math 7\",\"weight\":10,\"dateCreated\":\"2024-09-01T12:00:00.000Z\"}]",
        "grades": "{\"1725000000002\":{\"1725000000000_0\":\"3\",\"1725000000000_1\":\"1\"}}"
    });
    std::fs::write(&dump_path, dump.to_string()).expect("write dump");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "students.upsert", json!({ "name": "Replaced" }));

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.importBrowserStorage",
        json!({ "path": dump_path.to_string_lossy() }),
    );
    assert_eq!(imported["students"], 1);
    assert_eq!(imported["gradeCells"], 2);
    assert_eq!(imported["warnings"], json!([]));

    let listed = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["students"][0]["name"], "Ada");

    let sheet = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "grades.sheet",
        json!({ "assignmentId": "1725000000002" }),
    );
    assert_eq!(sheet["rows"][0]["levels"], json!([3, 1]));
    assert_eq!(sheet["rows"][0]["overall"].as_f64(), Some(75.0));

    let cycle = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "schedule.cycleDay",
        json!({ "date": "2024-09-11" }),
    );
    assert_eq!(cycle["cycleDay"], 1);
    assert_eq!(cycle["classes"], json!(["Math 7"]));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
