//! Newline-delimited JSON over stdio. One request per line, one response per
//! line, answered in order. Each handler family owns a `try_handle` that
//! claims the methods it knows.

mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};
