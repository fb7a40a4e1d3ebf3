use crate::db;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, read_text_input, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::legacy;
use crate::store;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
    }))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> HandlerResult {
    let path = PathBuf::from(req_str(&req.params, "path")?);
    let conn = db::open_db(&path).map_err(|e| {
        HandlerErr::new("db_open_failed", format!("{e:#}"))
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    tracing::info!(workspace = %path.display(), "workspace opened");
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

/// Replaces every collection with the contents of an old browser-storage dump.
fn handle_import_browser_storage(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let (text, _) = read_text_input(&req.params)?;
    let imported = legacy::parse_browser_dump(&text)?;
    store::replace_snapshot(conn, &imported.snapshot)?;
    let snap = &imported.snapshot;
    tracing::info!(
        students = snap.students.len(),
        rubrics = snap.saved_rubrics.len(),
        assignments = snap.assignments.len(),
        warnings = imported.warnings.len(),
        "browser storage imported"
    );
    Ok(json!({
        "students": snap.students.len(),
        "rubrics": snap.saved_rubrics.len(),
        "assignments": snap.assignments.len(),
        "gradeCells": snap.grades.cell_count(),
        "holidays": snap.schedule_config.holidays.len(),
        "warnings": imported.warnings,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state, req),
        "workspace.select" => handle_workspace_select(state, req),
        "workspace.importBrowserStorage" => handle_import_browser_storage(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
