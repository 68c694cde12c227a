//! Tracing subscriber setup for the `snag` CLI.
//!
//! Logs always go to stderr so stdout stays clean for command output.

use std::io::{self, IsTerminal};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter directive for the given verbosity flags.
///
/// `quiet` wins over `verbose`. Dependencies stay at their own defaults.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "snag=error";
    }
    match verbose {
        0 => "snag=warn",
        1 => "snag=info",
        2 => "snag=debug",
        _ => "snag=trace",
    }
}

/// Initialize the tracing subscriber based on CLI flags and environment.
///
/// # Environment Variables
///
/// * `RUST_LOG` - Override default filter (e.g., "snag=debug,rusqlite=warn")
///
/// # Output Behavior
///
/// | Mode | TTY | Output |
/// |------|-----|--------|
/// | Robot | any | JSON lines to stderr |
/// | Human | yes | Pretty colored output to stderr |
/// | Human | no | Compact plain output to stderr |
pub fn init_logging(robot_mode: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let base = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(io::stderr);

    // try_init: a second call (e.g. from tests) keeps the first subscriber.
    let _ = if robot_mode {
        tracing_subscriber::registry()
            .with(filter)
            .with(base.json().with_target(true))
            .try_init()
    } else if io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(filter)
            .with(base.with_target(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(base.with_ansi(false).with_target(false).compact())
            .try_init()
    };
}
