mod backup;
mod calc;
mod calendar;
mod curriculum;
mod cycle;
mod dates;
mod db;
mod error;
mod exchange;
mod grading;
mod ipc;
mod legacy;
mod logging;
mod model;
mod roster;
mod rubric;
mod schedule;
mod store;
mod view;

use serde_json::json;
use std::io::{self, BufRead, Write};

fn main() {
    logging::init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gradebookd starting");

    let mut state = ipc::AppState::new(view::ViewState::new(chrono::Local::now().date_naive()));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to reply to.
                tracing::warn!(error = %e, "bad request line");
                let resp = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(stdout, "{}", resp);
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
}
