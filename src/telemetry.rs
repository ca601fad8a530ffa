//! Diagnostic output via `tracing`.

use std::io::{self, IsTerminal};
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Installs a stderr `fmt` subscriber filtered by `filter` (e.g. `"info"` or
/// `"voidloader=debug"`).
///
/// Only the first call does anything. If the process already has a global
/// subscriber, that one is kept and this returns `false`.
pub fn init(filter: &str) -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .try_init()
            .is_ok()
    })
}
