use crate::curriculum;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, new_id, now_iso, opt_str, opt_string_list, req_i64, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::{Criterion, CurriculumRef, Rubric};
use crate::rubric::{self, RubricDraft};
use crate::store::{self, Repo};
use serde::de::DeserializeOwned;
use serde_json::json;

fn typed_param<T: DeserializeOwned>(req: &Request, key: &str) -> Result<Option<T>, HandlerErr> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| HandlerErr::new("bad_params", format!("invalid {}: {}", key, e))),
    }
}

/// Stores a validated draft, creating or replacing by id.
fn save_draft(state: &AppState, draft: RubricDraft) -> HandlerResult {
    let repo = Repo::<Rubric>::new(db(state)?);
    let existing = match draft.id.as_deref() {
        Some(id) => Some(repo.require(id)?),
        None => None,
    };
    let id = existing.as_ref().map(|r| r.id.clone()).unwrap_or_else(new_id);
    let rubric = rubric::build_rubric(draft, id, existing.as_ref(), &now_iso())?;
    let created = repo.upsert(rubric.clone())?;
    Ok(json!({ "rubric": rubric, "created": created }))
}

fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    let rubrics = Repo::<Rubric>::new(db(state)?).list()?;
    Ok(json!({ "rubrics": rubrics }))
}

fn handle_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let rubric = Repo::<Rubric>::new(db(state)?).require(req_str(&req.params, "id")?)?;
    Ok(json!({ "rubric": rubric }))
}

fn handle_upsert(state: &mut AppState, req: &Request) -> HandlerResult {
    let draft = RubricDraft {
        id: opt_str(&req.params, "id")?.map(str::to_string),
        title: req_str(&req.params, "title")?.to_string(),
        task_description: opt_str(&req.params, "taskDescription")?.map(str::to_string),
        criteria: typed_param::<Vec<Criterion>>(req, "criteria")?.unwrap_or_default(),
        num_levels: req_i64(&req.params, "numLevels")?,
        level_names: opt_string_list(&req.params, "levelNames")?.unwrap_or_default(),
        curriculum: typed_param::<CurriculumRef>(req, "curriculum")?,
    };
    save_draft(state, draft)
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = req_str(&req.params, "id")?;
    let summary = store::delete_rubric_cascade(db(state)?, id)?;
    Ok(json!(summary))
}

fn handle_from_curriculum(state: &mut AppState, req: &Request) -> HandlerResult {
    let competency_ids = opt_string_list(&req.params, "competencyIds")?;
    let draft = rubric::draft_from_curriculum(
        req_str(&req.params, "subject")?,
        req_str(&req.params, "grade")?,
        req_str(&req.params, "title")?,
        opt_string_list(&req.params, "levelNames")?.unwrap_or_default(),
        competency_ids.as_deref(),
    )?;
    save_draft(state, draft)
}

fn handle_curriculum_subjects(_state: &mut AppState, _req: &Request) -> HandlerResult {
    let subjects = curriculum::subjects()?;
    Ok(json!({ "subjects": subjects }))
}

fn handle_curriculum_grade(_state: &mut AppState, req: &Request) -> HandlerResult {
    let subject = req_str(&req.params, "subject")?;
    let grade = req_str(&req.params, "grade")?;
    let entry = curriculum::grade(subject, grade)?;
    Ok(json!({ "subject": subject, "grade": grade, "entry": entry }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "rubrics.list" => handle_list(state, req),
        "rubrics.get" => handle_get(state, req),
        "rubrics.upsert" => handle_upsert(state, req),
        "rubrics.delete" => handle_delete(state, req),
        "rubrics.fromCurriculum" => handle_from_curriculum(state, req),
        "curriculum.subjects" => handle_curriculum_subjects(state, req),
        "curriculum.grade" => handle_curriculum_grade(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
