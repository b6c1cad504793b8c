//! Rendering and dispatch strategies.
//!
//! An [`Interceptor`] turns an event into a line (`translate`) and decides
//! where that line goes besides the log file (`process`). The logger treats
//! interceptors as opaque; swapping one changes both the look of every line and
//! its console/sink routing.
//!
//! Implementations:
//! - [`ConsoleInterceptor`] - human readable lines, stdout/stderr routing
//! - [`JsonInterceptor`] - one compact JSON object per event
//! - [`ReporterInterceptor`] - console behaviour plus forwarding to a [`ReportSink`]

use std::fmt;
use std::io::Write;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::payload::Payload;
use crate::types::{ErrorLevel, Tags};

pub mod console;
pub mod json;
pub mod reporter;

pub use console::{ConsoleInterceptor, ConsoleLine};
pub use json::{JsonInterceptor, JsonOptions, JsonRecord};
pub use reporter::{Report, ReportLevel, ReportSink, ReporterInterceptor, ReporterOptions, TracingSink};

/// Everything an interceptor needs to render one event.
#[derive(Debug, Clone, Copy)]
pub struct TranslateArgs<'a> {
    /// Event severity.
    pub level: ErrorLevel,
    /// Contextual tags; empty for calls made directly on a logger.
    pub tags: &'a Tags,
    /// What the caller logged.
    pub payload: &'a Payload,
}

/// Pluggable rendering and dispatch strategy.
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// Renders an event into a single line. An empty string drops the event.
    fn translate(&self, args: &TranslateArgs<'_>) -> String;

    /// Dispatches a rendered line for the given level.
    fn process(&self, level: ErrorLevel, line: &str);
}

/// Destination for console output.
pub trait Console: Send + Sync + fmt::Debug {
    /// Writes a line to the standard output stream.
    fn stdout(&self, line: &str);

    /// Writes a line to the standard error stream.
    fn stderr(&self, line: &str);
}

/// Process standard output and error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn stdout(&self, line: &str) {
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }

    fn stderr(&self, line: &str) {
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }
}

/// Console that keeps lines in memory, for asserting on routing.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    out: Mutex<Vec<String>>,
    err: Mutex<Vec<String>>,
}

impl CapturedConsole {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written to standard output so far.
    #[must_use]
    pub fn stdout_lines(&self) -> Vec<String> {
        self.out.lock().clone()
    }

    /// Lines written to standard error so far.
    #[must_use]
    pub fn stderr_lines(&self) -> Vec<String> {
        self.err.lock().clone()
    }
}

impl Console for CapturedConsole {
    fn stdout(&self, line: &str) {
        self.out.lock().push(line.to_string());
    }

    fn stderr(&self, line: &str) {
        self.err.lock().push(line.to_string());
    }
}

/// Default routing: warnings and criticals to stderr, the rest to stdout.
///
/// Empty lines are dropped.
pub fn route(console: &dyn Console, level: ErrorLevel, line: &str) {
    if line.is_empty() {
        return;
    }

    if level.is_error_stream() {
        console.stderr(line);
    } else {
        console.stdout(line);
    }
}

/// ANSI CSI sequences (colours, cursor movement).
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap_or_else(|_| unreachable!())
});

/// Removes terminal escape sequences from `text`.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_splits_by_severity() {
        let console = CapturedConsole::new();
        route(&console, ErrorLevel::Info, "i");
        route(&console, ErrorLevel::Log, "l");
        route(&console, ErrorLevel::Debug, "d");
        route(&console, ErrorLevel::Warning, "w");
        route(&console, ErrorLevel::Critical, "c");

        assert_eq!(console.stdout_lines(), vec!["i", "l", "d"]);
        assert_eq!(console.stderr_lines(), vec!["w", "c"]);
    }

    #[test]
    fn route_drops_empty_lines() {
        let console = CapturedConsole::new();
        route(&console, ErrorLevel::Critical, "");
        assert!(console.stderr_lines().is_empty());
    }

    #[test]
    fn strip_ansi_removes_colours() {
        assert_eq!(strip_ansi("\x1b[31mERR\x1b[0m: boom"), "ERR: boom");
        assert_eq!(strip_ansi("\x1b[1;94mINFO\x1b[0m"), "INFO");
        assert_eq!(strip_ansi("no codes"), "no codes");
    }
}
