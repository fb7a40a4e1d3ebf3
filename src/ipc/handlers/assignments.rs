use crate::grading;
use crate::ipc::error::HandlerResult;
use crate::ipc::helpers::{db, new_id, now_iso, opt_f64, opt_str, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, Rubric};
use crate::store::{self, Repo};
use serde_json::json;
use std::collections::HashMap;

/// Assignments with the rubric title resolved at read time; a deleted rubric
/// yields a null title.
fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let assignments = Repo::<Assignment>::new(conn).list()?;
    let rubrics = Repo::<Rubric>::new(conn).list()?;
    let titles: HashMap<&str, &str> = rubrics
        .iter()
        .map(|r| (r.id.as_str(), r.title.as_str()))
        .collect();
    let rows: Vec<serde_json::Value> = assignments
        .iter()
        .map(|a| {
            let mut row = json!(a);
            row["rubricTitle"] = json!(titles.get(a.rubric_id.as_str()));
            row
        })
        .collect();
    Ok(json!({ "assignments": rows }))
}

fn handle_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let rubric = Repo::<Rubric>::new(conn).require(req_str(&req.params, "rubricId")?)?;
    let assignment = grading::build_assignment(
        new_id(),
        &rubric,
        req_str(&req.params, "dueDate")?,
        opt_str(&req.params, "classPeriod")?.unwrap_or(""),
        opt_f64(&req.params, "weight")?,
        &now_iso(),
    )?;
    Repo::<Assignment>::new(conn).upsert(assignment.clone())?;
    tracing::info!(assignment_id = %assignment.id, rubric_id = %rubric.id, "assignment created");
    let mut out = json!(assignment);
    out["rubricTitle"] = json!(rubric.title);
    Ok(json!({ "assignment": out }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = req_str(&req.params, "id")?;
    let summary = store::delete_assignment_cascade(db(state)?, id)?;
    if state.view.selected_assignment_id.as_deref() == Some(id) {
        state.view.selected_assignment_id = None;
    }
    Ok(json!(summary))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "assignments.list" => handle_list(state, req),
        "assignments.create" => handle_create(state, req),
        "assignments.delete" => handle_delete(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
