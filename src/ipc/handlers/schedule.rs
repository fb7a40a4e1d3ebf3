use crate::cycle;
use crate::exchange::{self, CalendarFormat};
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::helpers::{db, opt_i64, opt_str, read_text_input, req_date, req_i64, req_str};
use crate::ipc::router::respond;
use crate::ipc::types::{AppState, Request};
use crate::schedule::{self, HolidayMergeMode};
use crate::store;
use serde_json::json;

fn handle_schedule_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    let cfg = store::load_schedule(db(state)?)?;
    Ok(json!({ "schedule": cfg }))
}

fn handle_schedule_save(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let mut cfg = store::load_schedule(conn)?;
    let cycle_length = opt_i64(&req.params, "cycleLength")?.unwrap_or(i64::from(cfg.cycle_length));
    schedule::apply_settings(
        &mut cfg,
        cycle_length,
        opt_str(&req.params, "startDate")?,
        opt_str(&req.params, "endDate")?,
    )?;
    store::save_schedule(conn, &cfg)?;
    Ok(json!({ "schedule": cfg }))
}

fn handle_add_class(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let day = req_i64(&req.params, "day")?;
    let class_name = req_str(&req.params, "className")?;
    let mut cfg = store::load_schedule(conn)?;
    schedule::add_class(&mut cfg, day, class_name)?;
    store::save_schedule(conn, &cfg)?;
    Ok(json!({ "schedule": cfg }))
}

fn handle_remove_class(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let day = req_i64(&req.params, "day")?;
    let index = req_i64(&req.params, "index")?;
    let (Ok(day), Ok(index)) = (u32::try_from(day), usize::try_from(index)) else {
        return Err(HandlerErr::new("bad_params", "day and index must be non-negative"));
    };
    let mut cfg = store::load_schedule(conn)?;
    let removed = schedule::remove_class(&mut cfg, day, index)?;
    store::save_schedule(conn, &cfg)?;
    Ok(json!({ "removed": removed, "schedule": cfg }))
}

fn handle_class_periods(state: &mut AppState, _req: &Request) -> HandlerResult {
    let cfg = store::load_schedule(db(state)?)?;
    Ok(json!({ "classPeriods": cfg.class_periods() }))
}

fn handle_cycle_day(state: &mut AppState, req: &Request) -> HandlerResult {
    let cfg = store::load_schedule(db(state)?)?;
    let date = req_date(&req.params, "date")?;
    let info = cycle::describe_date(&cfg, date)?;
    Ok(json!(info))
}

fn handle_holidays_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    let cfg = store::load_schedule(db(state)?)?;
    Ok(json!({ "holidays": cfg.holidays }))
}

fn handle_holidays_add(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let mut cfg = store::load_schedule(conn)?;
    let added = schedule::add_holiday(&mut cfg, req_str(&req.params, "date")?)?;
    if added {
        store::save_schedule(conn, &cfg)?;
    }
    Ok(json!({ "added": added, "holidays": cfg.holidays }))
}

fn handle_holidays_remove(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let mut cfg = store::load_schedule(conn)?;
    let removed = schedule::remove_holiday(&mut cfg, req_str(&req.params, "date")?)?;
    if removed {
        store::save_schedule(conn, &cfg)?;
    }
    Ok(json!({ "removed": removed, "holidays": cfg.holidays }))
}

/// Calendar file import. `replace` (the default) discards the current list.
fn handle_holidays_import(state: &mut AppState, req: &Request) -> HandlerResult {
    let conn = db(state)?;
    let (text, path) = read_text_input(&req.params)?;
    let format = match opt_str(&req.params, "format")? {
        Some(f) => CalendarFormat::parse(f)
            .ok_or_else(|| HandlerErr::new("bad_params", "format must be csv or json"))?,
        None => path
            .as_deref()
            .and_then(CalendarFormat::from_path)
            .ok_or_else(|| {
                HandlerErr::new("bad_params", "cannot infer format; pass format: csv or json")
            })?,
    };
    let mode = match opt_str(&req.params, "mode")? {
        Some(m) => HolidayMergeMode::parse(m)
            .ok_or_else(|| HandlerErr::new("bad_params", "mode must be replace or merge"))?,
        None => HolidayMergeMode::Replace,
    };

    let parsed = exchange::parse_holidays(&text, format)?;
    let imported = parsed.dates.len();
    let mut cfg = store::load_schedule(conn)?;
    let summary = schedule::merge_holidays(&mut cfg, parsed.dates, mode);
    store::save_schedule(conn, &cfg)?;
    tracing::info!(imported, total = summary.total, warnings = parsed.warnings.len(), "holidays imported");
    Ok(json!({
        "imported": imported,
        "added": summary.added,
        "total": parsed.total,
        "holidayCount": summary.total,
        "warnings": parsed.warnings,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "schedule.get" => handle_schedule_get(state, req),
        "schedule.save" => handle_schedule_save(state, req),
        "schedule.addClass" => handle_add_class(state, req),
        "schedule.removeClass" => handle_remove_class(state, req),
        "schedule.classPeriods" => handle_class_periods(state, req),
        "schedule.cycleDay" => handle_cycle_day(state, req),
        "holidays.list" => handle_holidays_list(state, req),
        "holidays.add" => handle_holidays_add(state, req),
        "holidays.remove" => handle_holidays_remove(state, req),
        "holidays.import" => handle_holidays_import(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
