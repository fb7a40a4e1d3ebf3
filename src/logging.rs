use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "GRADEBOOKD_LOG";
const DEFAULT_FILTER: &str = "gradebookd=info";

static INIT: Once = Once::new();

/// Installs the stderr subscriber. Stdout carries the IPC stream, so nothing
/// may be logged there.
///
/// Reads `GRADEBOOKD_LOG` (e.g. `gradebookd=debug`), falling back to
/// `gradebookd=info` when unset or invalid. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
