//! Param extraction shared by the handlers. Missing or mistyped params are
//! validation errors (`bad_params`).

use super::error::HandlerErr;
use super::types::AppState;
use crate::dates;
use crate::error::GradebookError;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::Value;

pub fn db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| GradebookError::NoWorkspace.into())
}

fn present<'v>(params: &'v Value, key: &str) -> Option<&'v Value> {
    params.get(key).filter(|v| !v.is_null())
}

pub fn req_str<'v>(params: &'v Value, key: &str) -> Result<&'v str, HandlerErr> {
    match present(params, key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) | None => {
            Err(GradebookError::validation(format!("missing {}", key)).into())
        }
        Some(_) => Err(GradebookError::validation(format!("{} must be a string", key)).into()),
    }
}

/// Blank strings count as absent.
pub fn opt_str<'v>(params: &'v Value, key: &str) -> Result<Option<&'v str>, HandlerErr> {
    match present(params, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim()).filter(|s| !s.is_empty())),
        Some(_) => Err(GradebookError::validation(format!("{} must be a string", key)).into()),
    }
}

pub fn opt_i64(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match present(params, key) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| GradebookError::validation(format!("{} must be an integer", key)).into()),
    }
}

pub fn req_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    opt_i64(params, key)?.ok_or_else(|| GradebookError::validation(format!("missing {}", key)).into())
}

pub fn opt_f64(params: &Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match present(params, key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| GradebookError::validation(format!("{} must be a number", key)).into()),
    }
}

pub fn opt_string_list(params: &Value, key: &str) -> Result<Option<Vec<String>>, HandlerErr> {
    match present(params, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    GradebookError::validation(format!("{} must contain strings", key)).into()
                })
            })
            .collect::<Result<Vec<_>, HandlerErr>>()
            .map(Some),
        Some(_) => Err(GradebookError::validation(format!("{} must be an array", key)).into()),
    }
}

pub fn req_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    Ok(dates::parse_date(req_str(params, key)?)?)
}

/// `params.today` when given (lets callers and tests pin the clock), else the
/// local date.
pub fn today(params: &Value) -> Result<NaiveDate, HandlerErr> {
    match opt_str(params, "today")? {
        Some(s) => Ok(dates::parse_date(s)?),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// File contents from `params.path`, or inline `params.text`.
pub fn read_text_input(params: &Value) -> Result<(String, Option<String>), HandlerErr> {
    if let Some(text) = present(params, "text").and_then(Value::as_str) {
        return Ok((text.to_string(), None));
    }
    let path = req_str(params, "path")
        .map_err(|_| HandlerErr::new("bad_params", "missing path or text"))?;
    let text = std::fs::read_to_string(path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string()).with_details(serde_json::json!({ "path": path }))
    })?;
    Ok((text, Some(path.to_string())))
}
