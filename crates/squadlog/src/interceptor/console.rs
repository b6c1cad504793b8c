//! Human readable console rendering.
//!
//! Lines look like:
//!
//! ```text
//! [2024-03-05 07:08:09] INFO: {[auth] ddSpanID:2; ddTraceID:1; user:7;} signed in
//! ```
//!
//! The tag block lists the layer name first (bracketed), then every other tag
//! as `name:value;`. Calls made without a squad render an empty block `{}`.

use std::sync::Arc;

use colored::{Color, Colorize};

use crate::clock::{Clock, SystemClock};
use crate::interceptor::{route, strip_ansi, Console, Interceptor, StdConsole, TranslateArgs};
use crate::payload::Payload;
use crate::squad::TAG_LAYER_NAME;
use crate::types::{ErrorLevel, RuntimeMode, Tags};

/// Timestamp layout of every console line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Replacement for newlines outside local mode.
pub const NEWLINE_PLACEHOLDER: &str = "↩";

/// Console label and colour for a level. Unlabelled levels render as `?`.
const fn level_style(level: ErrorLevel) -> Option<(&'static str, Color)> {
    match level {
        ErrorLevel::Info => Some(("INFO", Color::BrightBlue)),
        ErrorLevel::Log => Some(("LOG", Color::White)),
        ErrorLevel::Warning => Some(("WARN", Color::BrightYellow)),
        ErrorLevel::Critical => Some(("ERR", Color::Red)),
        ErrorLevel::Debug => None,
    }
}

/// The default interceptor: readable lines routed to stdout or stderr.
#[derive(Debug, Clone)]
pub struct ConsoleInterceptor {
    runtime: RuntimeMode,
    clock: Arc<dyn Clock>,
    console: Arc<dyn Console>,
}

impl Default for ConsoleInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleInterceptor {
    /// Creates a console interceptor for a deployed environment, stamping
    /// lines in UTC and writing to the process streams.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: RuntimeMode::default(),
            clock: Arc::new(SystemClock::utc()),
            console: Arc::new(StdConsole),
        }
    }

    /// Sets the runtime mode.
    #[must_use]
    pub const fn with_runtime(mut self, runtime: RuntimeMode) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets the clock used for timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the output streams.
    #[must_use]
    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    /// Returns the runtime mode.
    #[must_use]
    pub const fn runtime(&self) -> RuntimeMode {
        self.runtime
    }

    /// Returns the output streams.
    #[must_use]
    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    /// Renders the message part of a line as `(plain, styled)`.
    ///
    /// Warnings and criticals carrying an error use the error's own
    /// location-aware rendering.
    fn transform(level: ErrorLevel, payload: &Payload) -> (String, String) {
        if level.is_error_stream() {
            match payload {
                Payload::Report(report) => return (report.plain(), report.colored()),
                Payload::Failure(failure) => return (failure.plain(), failure.colored()),
                Payload::Text(_) | Payload::Value(_) => {}
            }
        }

        let plain = payload.display_string();
        (plain.clone(), plain)
    }
}

impl Interceptor for ConsoleInterceptor {
    fn translate(&self, args: &TranslateArgs<'_>) -> String {
        let local = self.runtime.is_local();
        let (plain, styled) = Self::transform(args.level, args.payload);

        let message = if local {
            styled
        } else {
            strip_ansi(&plain).replace('\n', NEWLINE_PLACEHOLDER)
        };

        let label = match level_style(args.level) {
            Some((label, color)) if local => label.color(color).to_string(),
            Some((label, _)) => label.to_string(),
            None => "?".to_string(),
        };

        format!(
            "[{}] {}: {} {}",
            self.clock.now().format(TIMESTAMP_FORMAT),
            label,
            render_tags(args.tags),
            message
        )
    }

    fn process(&self, level: ErrorLevel, line: &str) {
        route(self.console.as_ref(), level, line);
    }
}

/// Renders the `{...}` tag block.
#[must_use]
pub fn render_tags(tags: &Tags) -> String {
    let mut block = String::from("{");
    if let Some(layer) = tags.get(TAG_LAYER_NAME) {
        block.push('[');
        block.push_str(layer);
        block.push(']');
    }

    for (name, value) in tags {
        if name == TAG_LAYER_NAME {
            continue;
        }
        if block.len() > 1 {
            block.push(' ');
        }
        block.push_str(name);
        block.push(':');
        block.push_str(value);
        block.push(';');
    }

    block.push('}');
    block
}

/// A console line split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    /// Timestamp text as rendered.
    pub timestamp: String,
    /// Level label (`INFO`, `LOG`, `WARN`, `ERR` or `?`).
    pub label: String,
    /// Tags, including the layer name under its reserved key.
    pub tags: Tags,
    /// Everything after the tag block.
    pub message: String,
}

impl ConsoleLine {
    /// Parses a line produced by [`ConsoleInterceptor`]. Styling is ignored.
    ///
    /// Returns `None` when the line does not have the console shape.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = strip_ansi(line);
        let rest = line.strip_prefix('[')?;
        let (timestamp, rest) = rest.split_once("] ")?;
        let (label, rest) = rest.split_once(": ")?;
        let rest = rest.strip_prefix('{')?;
        let end = rest.find('}')?;
        let block = &rest[..end];
        let message = rest[end + 1..].strip_prefix(' ')?;

        Some(Self {
            timestamp: timestamp.to_string(),
            label: label.to_string(),
            tags: parse_tags(block)?,
            message: message.to_string(),
        })
    }

    /// Maps the label back to a level. `?` has no level.
    #[must_use]
    pub fn level(&self) -> Option<ErrorLevel> {
        ErrorLevel::ALL
            .into_iter()
            .find(|level| level_style(*level).is_some_and(|(label, _)| label == self.label))
    }
}

fn parse_tags(block: &str) -> Option<Tags> {
    let mut tags = Tags::new();
    let mut rest = block;

    if let Some(after) = rest.strip_prefix('[') {
        let (layer, after) = after.split_once(']')?;
        tags.insert(TAG_LAYER_NAME.to_string(), layer.to_string());
        rest = after;
    }

    for piece in rest.split(';') {
        let piece = piece.trim_start();
        if piece.is_empty() {
            continue;
        }
        let (name, value) = piece.split_once(':')?;
        tags.insert(name.to_string(), value.to_string());
    }

    Some(tags)
}
