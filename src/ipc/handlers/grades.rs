use crate::calc;
use crate::grading;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, opt_i64, opt_str, req_i64, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, Rubric, Student};
use crate::roster;
use crate::store::{self, Repo};
use serde_json::json;

fn handle_set(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let assignment_id = req_str(&req.params, "assignmentId")?;
    let student_id = req_str(&req.params, "studentId")?;
    let criterion_index = req_i64(&req.params, "criterionIndex")?;
    if req.params.get("level").is_none() {
        return Err(HandlerErr::new("bad_params", "missing level (use null to clear)"));
    }
    let level = opt_i64(&req.params, "level")?;

    let assignment = Repo::<Assignment>::new(conn).require(assignment_id)?;
    let rubric = Repo::<Rubric>::new(conn).require(&assignment.rubric_id)?;
    Repo::<Student>::new(conn).require(student_id)?;
    let (criterion, level) = grading::check_cell(&rubric, criterion_index, level)?;

    let mut grades = store::load_grades(conn)?;
    grades.set(assignment_id, student_id, criterion, level);
    store::save_grades(conn, &grades)?;

    let levels = grades.levels_for(assignment_id, student_id, rubric.criteria.len());
    let average = calc::rubric_average(levels, rubric.num_levels);
    Ok(json!({
        "assignmentId": assignment_id,
        "studentId": student_id,
        "criterionIndex": criterion,
        "level": level,
        "overall": average.overall.map(calc::round_off_1_decimal),
    }))
}

fn handle_sheet(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let assignment = Repo::<Assignment>::new(conn).require(req_str(&req.params, "assignmentId")?)?;
    let rubric = Repo::<Rubric>::new(conn).require(&assignment.rubric_id)?;
    let students = Repo::<Student>::new(conn).list()?;
    let grades = store::load_grades(conn)?;
    Ok(json!(calc::grade_sheet(&assignment, &rubric, &students, &grades)))
}

fn handle_student_summary(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let students = Repo::<Student>::new(conn).list()?;
    let selected: Vec<Student> =
        roster::filter_students(&students, None, opt_str(&req.params, "classSection")?)
            .into_iter()
            .cloned()
            .collect();
    let assignments = Repo::<Assignment>::new(conn).list()?;
    let rubrics = Repo::<Rubric>::new(conn).list()?;
    let grades = store::load_grades(conn)?;
    let rows = calc::student_summaries(&selected, &assignments, &rubrics, &grades);
    Ok(json!({ "students": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.set" => handle_set(state, req),
        "grades.sheet" => handle_sheet(state, req),
        "grades.studentSummary" => handle_student_summary(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
