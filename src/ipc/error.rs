use crate::error::GradebookError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// A failed handler, already mapped to its wire code.
#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<GradebookError> for HandlerErr {
    fn from(e: GradebookError) -> Self {
        let details = match &e {
            GradebookError::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            GradebookError::InvalidRange { start, target } => Some(json!({
                "startDate": crate::dates::format_date(*start),
                "date": crate::dates::format_date(*target),
            })),
            GradebookError::Corrupt { key, .. } => Some(json!({ "key": key })),
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

pub type HandlerResult = Result<serde_json::Value, HandlerErr>;
