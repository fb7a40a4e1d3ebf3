use crate::calendar::{self, CalendarSource};
use crate::dates;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, opt_i64, opt_str, today};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, Rubric};
use crate::store::{self, Repo};
use serde_json::json;

/// Year/month from params, falling back to the current view.
fn month_params(state: &AppState, req: &Request) -> Result<(i32, u32), HandlerErr> {
    let year = match opt_i64(&req.params, "year")? {
        Some(y) => i32::try_from(y).map_err(|_| HandlerErr::new("bad_params", "year out of range"))?,
        None => state.view.year(),
    };
    let month = match opt_i64(&req.params, "month")? {
        Some(m) if (1..=12).contains(&m) => m as u32,
        Some(_) => return Err(HandlerErr::new("bad_params", "month must be 1..12")),
        None => state.view.month(),
    };
    Ok((year, month))
}

fn handle_month(state: &mut AppState, req: &Request) -> HandlerResult {
    let (year, month) = month_params(state, req)?;
    let today = today(&req.params)?;
    let conn = db(state)?;
    let schedule = store::load_schedule(conn)?;
    let assignments = Repo::<Assignment>::new(conn).list()?;
    let rubrics = Repo::<Rubric>::new(conn).list()?;
    let src = CalendarSource {
        schedule: &schedule,
        assignments: &assignments,
        rubrics: &rubrics,
        today,
    };
    let grid = calendar::month_grid(&src, year, month)?;
    Ok(json!(grid))
}

fn handle_week(state: &mut AppState, req: &Request) -> HandlerResult {
    let anchor = match opt_str(&req.params, "date")? {
        Some(d) => dates::parse_date(d)?,
        None => state.view.anchor,
    };
    let today = today(&req.params)?;
    let conn = db(state)?;
    let schedule = store::load_schedule(conn)?;
    let assignments = Repo::<Assignment>::new(conn).list()?;
    let rubrics = Repo::<Rubric>::new(conn).list()?;
    let src = CalendarSource {
        schedule: &schedule,
        assignments: &assignments,
        rubrics: &rubrics,
        today,
    };
    Ok(json!(calendar::week_grid(&src, anchor)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "calendar.month" => handle_month(state, req),
        "calendar.week" => handle_week(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
