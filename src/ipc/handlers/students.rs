use crate::exchange;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, new_id, now_iso, opt_str, opt_string_list, read_text_input, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::roster;
use crate::store::{self, Repo};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let students = Repo::<Student>::new(db(state)?).list()?;
    let filtered = roster::filter_students(
        &students,
        opt_str(&req.params, "search")?,
        opt_str(&req.params, "classSection")?,
    );
    Ok(json!({ "students": filtered, "total": students.len() }))
}

fn handle_sections(state: &mut AppState, _req: &Request) -> HandlerResult {
    let students = Repo::<Student>::new(db(state)?).list()?;
    Ok(json!({ "sections": roster::class_sections(&students) }))
}

fn handle_upsert(state: &mut AppState, req: &Request) -> HandlerResult {
    let repo = Repo::<Student>::new(db(state)?);
    let existing = match opt_str(&req.params, "id")? {
        Some(id) => Some(repo.require(id)?),
        None => None,
    };
    let id = existing.as_ref().map(|s| s.id.clone()).unwrap_or_else(new_id);
    let sections = opt_string_list(&req.params, "classSections")?.unwrap_or_default();
    let student = roster::build_student(
        id,
        req_str(&req.params, "name")?,
        opt_str(&req.params, "studentId")?,
        &sections,
        existing.as_ref(),
        &now_iso(),
    )?;
    let created = repo.upsert(student.clone())?;
    Ok(json!({ "student": student, "created": created }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = req_str(&req.params, "id")?;
    let summary = store::delete_student_cascade(db(state)?, id)?;
    Ok(json!(summary))
}

/// Rows are appended; existing students are never matched or merged.
fn handle_import_csv(state: &mut AppState, req: &Request) -> HandlerResult {
    let repo = Repo::<Student>::new(db(state)?);
    let (text, _) = read_text_input(&req.params)?;
    let (rows, warnings) = exchange::parse_roster_csv(&text);
    let now = now_iso();
    let students: Vec<Student> = rows
        .into_iter()
        .map(|row| roster::from_import_row(row, new_id(), &now))
        .collect();
    let imported = repo.append_all(students)?;
    tracing::info!(imported, warnings = warnings.len(), "roster imported");
    Ok(json!({ "imported": imported, "warnings": warnings }))
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> HandlerResult {
    let students = Repo::<Student>::new(db(state)?).list()?;
    let csv = exchange::export_roster_csv(&students);
    let out_path = opt_str(&req.params, "outPath")?;
    if let Some(path) = out_path {
        std::fs::write(path, &csv).map_err(|e| {
            HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": path }))
        })?;
    }
    Ok(json!({ "csv": csv, "count": students.len(), "path": out_path }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_list(state, req),
        "students.sections" => handle_sections(state, req),
        "students.upsert" => handle_upsert(state, req),
        "students.delete" => handle_delete(state, req),
        "students.importCsv" => handle_import_csv(state, req),
        "students.exportCsv" => handle_export_csv(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
