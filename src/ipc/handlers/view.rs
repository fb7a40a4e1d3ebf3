use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, opt_str, req_str, today};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::Assignment;
use crate::store::Repo;
use crate::view::{ViewAction, ViewMode};
use serde_json::json;

fn handle_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!(state.view.snapshot()))
}

fn handle_navigate(state: &mut AppState, req: &Request) -> HandlerResult {
    let action = match req_str(&req.params, "action")? {
        "prev" => ViewAction::Prev,
        "next" => ViewAction::Next,
        "today" => ViewAction::Today(today(&req.params)?),
        other => {
            return Err(HandlerErr::new(
                "bad_params",
                format!("action must be prev, next or today, got {:?}", other),
            ))
        }
    };
    state.view.apply(action);
    Ok(json!(state.view.snapshot()))
}

fn handle_set_mode(state: &mut AppState, req: &Request) -> HandlerResult {
    let mode = ViewMode::parse(req_str(&req.params, "mode")?)
        .ok_or_else(|| HandlerErr::new("bad_params", "mode must be month or week"))?;
    state.view.apply(ViewAction::SetMode(mode));
    Ok(json!(state.view.snapshot()))
}

fn handle_select_assignment(state: &mut AppState, req: &Request) -> HandlerResult {
    let selected = match opt_str(&req.params, "assignmentId")? {
        Some(id) => Some(Repo::<Assignment>::new(db(state)?).require(id)?.id),
        None => None,
    };
    state.view.apply(ViewAction::SelectAssignment(selected));
    Ok(json!(state.view.snapshot()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "view.get" => handle_get(state, req),
        "view.navigate" => handle_navigate(state, req),
        "view.setMode" => handle_set_mode(state, req),
        "view.selectAssignment" => handle_select_assignment(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
