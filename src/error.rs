use chrono::NaiveDate;

/// Domain failures surfaced to the front end. Each variant maps to a stable
/// wire code; the message is shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum GradebookError {
    #[error("could not parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("date {target} is before the cycle start date {start}")]
    InvalidRange { start: NaiveDate, target: NaiveDate },

    #[error("schedule start date is not configured")]
    NotConfigured,

    #[error("select a workspace first")]
    NoWorkspace,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("stored value for {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GradebookError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::Validation(_) => "bad_params",
            Self::NotFound { .. } => "not_found",
            Self::InvalidRange { .. } => "invalid_range",
            Self::NotConfigured => "not_configured",
            Self::NoWorkspace => "no_workspace",
            Self::Storage(_) => "db_query_failed",
            Self::Corrupt { .. } => "corrupt_state",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn parse(what: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            what,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;
