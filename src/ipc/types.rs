use std::path::PathBuf;

use crate::view::ViewState;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub view: ViewState,
}

impl AppState {
    pub fn new(view: ViewState) -> Self {
        Self {
            workspace: None,
            db: None,
            view,
        }
    }
}
