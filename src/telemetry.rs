//! Log output for the console binary.
//!
//! Everything goes to stderr; stdout is reserved for what the dashboard
//! shows. Controlled by:
//! - `RUST_LOG`: full filter directives, taking precedence when set
//! - `DASHBOARD_LOG_LEVEL`: `trace|debug|info|warn|error` (default `debug`)
//! - `DASHBOARD_SPAN_EVENTS`: `full`, `enter_exit`, otherwise close only
//! - `FORCE_COLOR`: `1|true|yes` or `0|false|no`, otherwise TTY detection

use std::env;
use std::io::IsTerminal;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

// ---

const DEFAULT_LEVEL: &str = "debug";

/// HTTP stack chatter is capped below the dashboard's own level.
const QUIET_DEPENDENCIES: &str = "hyper=warn,reqwest=warn";

/// Install the global subscriber. Call once, before anything logs.
pub fn init() {
    // ---
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events(env::var("DASHBOARD_SPAN_EVENTS").ok().as_deref()))
        .with_env_filter(env_filter())
        .with_ansi(color_enabled(env::var("FORCE_COLOR").ok().as_deref()))
        .compact()
        .init();
}

fn env_filter() -> EnvFilter {
    match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(directives(env::var("DASHBOARD_LOG_LEVEL").ok().as_deref())),
    }
}

/// Filter directives for a `DASHBOARD_LOG_LEVEL` value; unknown levels fall
/// back to the default.
fn directives(level: Option<&str>) -> String {
    // ---
    let level = level
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| matches!(l.as_str(), "trace" | "debug" | "info" | "warn" | "error"))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    format!("{level},{QUIET_DEPENDENCIES}")
}

fn span_events(mode: Option<&str>) -> FmtSpan {
    match mode {
        Some("full") => FmtSpan::FULL,
        Some("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    }
}

fn color_enabled(force: Option<&str>) -> bool {
    match force {
        Some("1" | "true" | "yes") => true,
        Some("0" | "false" | "no") => false,
        _ => std::io::stderr().is_terminal(),
    }
}
