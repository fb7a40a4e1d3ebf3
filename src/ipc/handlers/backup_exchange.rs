use crate::backup;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;
use std::path::PathBuf;

fn handle_export_bundle(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let out_path = req_str(&req.params, "outPath")?;
    let snapshot = store::read_snapshot(conn)?;
    let export = backup::export_state_bundle(&snapshot, &PathBuf::from(out_path)).map_err(|e| {
        HandlerErr::new("backup_failed", format!("{e:#}")).with_details(json!({ "path": out_path }))
    })?;
    tracing::info!(path = out_path, "state bundle exported");
    Ok(json!({
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count,
        "sha256": export.sha256,
    }))
}

/// Verifies the whole bundle before touching storage, then swaps every
/// collection in one transaction.
fn handle_import_bundle(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let in_path = req_str(&req.params, "inPath")?;
    let src = PathBuf::from(in_path);
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "bundle file not found")
            .with_details(json!({ "path": in_path })));
    }
    let (manifest, snapshot) = backup::read_state_bundle(&src).map_err(|e| {
        HandlerErr::new("backup_failed", format!("{e:#}")).with_details(json!({ "path": in_path }))
    })?;
    store::replace_snapshot(conn, &snapshot)?;
    tracing::info!(path = in_path, exported_at = %manifest.exported_at, "state bundle imported");
    Ok(json!({
        "bundleFormatDetected": manifest.format,
        "exportedAt": manifest.exported_at,
        "students": snapshot.students.len(),
        "rubrics": snapshot.saved_rubrics.len(),
        "assignments": snapshot.assignments.len(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportBundle" => handle_export_bundle(state, req),
        "backup.importBundle" => handle_import_bundle(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
