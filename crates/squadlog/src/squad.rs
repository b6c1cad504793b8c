//! Tagged sub-loggers.
//!
//! A [`Squad`] is created per unit of work (a request, a job) and stamps every
//! event it emits with its tags. Squads seeded from a [`TraceContext`] carry
//! the layer name and trace ids under reserved keys that callers cannot
//! overwrite. A layer name must satisfy the tag value rules to be stamped.

use std::fmt;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use tracing::warn;

use crate::logger::Logger;
use crate::payload::{ErrorReport, Payload};
use crate::types::{ErrorLevel, Tags, TraceContext};

/// Reserved tag holding the squad's layer name.
pub const TAG_LAYER_NAME: &str = "layerName";

/// Reserved tag holding the trace id.
pub const TAG_TRACE_ID: &str = "ddTraceID";

/// Reserved tag holding the span id.
pub const TAG_SPAN_ID: &str = "ddSpanID";

/// Tags only the squad itself may set.
pub const RESERVED_TAGS: [&str; 3] = [TAG_LAYER_NAME, TAG_TRACE_ID, TAG_SPAN_ID];

static TAG_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]{1,50}$").unwrap_or_else(|_| unreachable!())
});

static TAG_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9 ~!@#$%^&*()\-_=+.,?:|/]{1,255}$").unwrap_or_else(|_| unreachable!())
});

/// Returns true if `name` is reserved.
#[must_use]
pub fn is_reserved_tag(name: &str) -> bool {
    RESERVED_TAGS.contains(&name)
}

/// Returns true if `name` is a well-formed tag name.
#[must_use]
pub fn is_valid_tag_name(name: &str) -> bool {
    TAG_NAME.is_match(name)
}

/// Returns true if `value` is a well-formed tag value.
#[must_use]
pub fn is_valid_tag_value(value: &str) -> bool {
    TAG_VALUE.is_match(value)
}

/// A tag-carrying view of a [`Logger`].
pub struct Squad {
    logger: Logger,
    layer_name: String,
    tags: RwLock<Tags>,
}

impl fmt::Debug for Squad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Squad")
            .field("layer_name", &self.layer_name)
            .field("tags", &*self.tags.read())
            .finish_non_exhaustive()
    }
}

impl Squad {
    pub(crate) fn new(logger: Logger, ctx: Option<&TraceContext>, layer_name: String) -> Self {
        let mut tags = Tags::new();
        if let Some(ctx) = ctx {
            if is_valid_tag_value(&layer_name) {
                tags.insert(TAG_LAYER_NAME.to_string(), layer_name.clone());
            } else {
                warn!(layer = %layer_name, "layer name not stamped, invalid tag value");
            }
            tags.insert(TAG_TRACE_ID.to_string(), ctx.trace_id.to_string());
            tags.insert(TAG_SPAN_ID.to_string(), ctx.span_id.to_string());
        }

        Self {
            logger,
            layer_name,
            tags: RwLock::new(tags),
        }
    }

    /// The logger this squad emits through.
    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The layer name given at creation.
    #[must_use]
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// A snapshot of the current tags.
    #[must_use]
    pub fn tags(&self) -> Tags {
        self.tags.read().clone()
    }

    /// The trace context the squad was seeded with, if any.
    #[must_use]
    pub fn trace_context(&self) -> Option<TraceContext> {
        let tags = self.tags.read();
        let trace_id = tags.get(TAG_TRACE_ID)?.parse().ok()?;
        let span_id = tags.get(TAG_SPAN_ID)?.parse().ok()?;
        Some(TraceContext::new(trace_id, span_id))
    }

    /// Sets a tag. The value is stringified with `Display`.
    ///
    /// Returns false, leaving the tags untouched, when the name is reserved or
    /// malformed or the value is malformed.
    pub fn set_tag(&self, name: &str, value: impl fmt::Display) -> bool {
        let value = value.to_string();
        if is_reserved_tag(name) || !is_valid_tag_name(name) || !is_valid_tag_value(&value) {
            return false;
        }

        self.tags.write().insert(name.to_string(), value);
        true
    }

    fn emit(&self, level: ErrorLevel, payload: &Payload) {
        let tags = self.tags();
        self.logger.dispatch(level, &tags, payload);
    }

    /// Emits at debug level.
    pub fn debug(&self, payload: impl Into<Payload>) {
        self.emit(ErrorLevel::Debug, &payload.into());
    }

    /// Emits at info level.
    pub fn info(&self, payload: impl Into<Payload>) {
        self.emit(ErrorLevel::Info, &payload.into());
    }

    /// Emits formatted text at info level.
    pub fn info_fmt(&self, args: fmt::Arguments<'_>) {
        self.info(args);
    }

    /// Emits at log level.
    pub fn log(&self, payload: impl Into<Payload>) {
        self.emit(ErrorLevel::Log, &payload.into());
    }

    /// Emits formatted text at log level.
    pub fn log_fmt(&self, args: fmt::Arguments<'_>) {
        self.log(args);
    }

    /// Emits at warning level.
    pub fn warn(&self, payload: impl Into<Payload>) {
        self.emit(ErrorLevel::Warning, &payload.into());
    }

    /// Emits formatted text at warning level.
    pub fn warn_fmt(&self, args: fmt::Arguments<'_>) {
        self.warn(args);
    }

    /// Emits at critical level.
    pub fn err(&self, payload: impl Into<Payload>) {
        self.emit(ErrorLevel::Critical, &payload.into());
    }

    /// Emits an error report located at the caller.
    #[track_caller]
    pub fn err_fmt(&self, args: fmt::Arguments<'_>) {
        self.err(ErrorReport::new(args.to_string()));
    }

    /// Emits at critical level, flushes once and exits the process.
    #[track_caller]
    pub fn fatal(&self, payload: impl Into<Payload>) -> ! {
        let payload: Payload = payload.into();
        let report = payload.into_report();
        self.emit(ErrorLevel::Critical, &Payload::Report(report));
        self.logger.terminate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{CapturedConsole, ConsoleInterceptor, ConsoleLine};
    use crate::options::Options;
    use proptest::prelude::*;
    use std::sync::Arc;
    use test_case::test_case;

    fn captured_logger() -> (Logger, Arc<CapturedConsole>) {
        let console = Arc::new(CapturedConsole::new());
        let logger = Logger::new(
            Options::new().with_interceptor(Arc::new(
                ConsoleInterceptor::new().with_console(console.clone()),
            )),
        );
        (logger, console)
    }

    #[test]
    fn seeded_squad_carries_reserved_tags() {
        let (logger, _) = captured_logger();
        let squad = logger.create_squad(Some(&TraceContext::new(11, 22)), "repository");

        let tags = squad.tags();
        assert_eq!(tags.get(TAG_LAYER_NAME).map(String::as_str), Some("repository"));
        assert_eq!(tags.get(TAG_TRACE_ID).map(String::as_str), Some("11"));
        assert_eq!(tags.get(TAG_SPAN_ID).map(String::as_str), Some("22"));
        assert_eq!(squad.trace_context(), Some(TraceContext::new(11, 22)));
    }

    #[test]
    fn unseeded_squad_starts_empty() {
        let (logger, _) = captured_logger();
        let squad = logger.create_squad(None, "handler");
        assert!(squad.tags().is_empty());
        assert_eq!(squad.layer_name(), "handler");
        assert!(squad.trace_context().is_none());
    }

    #[test_case(TAG_TRACE_ID, "1" ; "reserved trace id")]
    #[test_case(TAG_LAYER_NAME, "x" ; "reserved layer name")]
    #[test_case("", "x" ; "empty name")]
    #[test_case("has space", "x" ; "space in name")]
    #[test_case("ok", "" ; "empty value")]
    #[test_case("ok", "new\nline" ; "newline in value")]
    #[test_case("ok", "semi;colon" ; "semicolon in value")]
    fn rejects_bad_tags(name: &str, value: &str) {
        let (logger, _) = captured_logger();
        let squad = logger.create_squad(None, "svc");
        assert!(!squad.set_tag(name, value));
        assert!(squad.tags().is_empty());
    }

    #[test]
    fn rejects_oversized_tags() {
        let (logger, _) = captured_logger();
        let squad = logger.create_squad(None, "svc");
        assert!(!squad.set_tag(&"n".repeat(51), "v"));
        assert!(!squad.set_tag("name", "v".repeat(256)));
        assert!(squad.set_tag(&"n".repeat(50), "v".repeat(255)));
    }

    #[test]
    fn accepted_tag_is_rendered() {
        let (logger, console) = captured_logger();
        let squad = logger.create_squad(Some(&TraceContext::new(1, 2)), "auth");

        assert!(squad.set_tag("ok", "value-1"));
        assert!(squad.set_tag("attempt", 3));
        squad.info("signed in");

        let lines = console.stdout_lines();
        assert_eq!(lines.len(), 1);
        let parsed = ConsoleLine::parse(&lines[0]).expect("console shape");
        assert_eq!(parsed.tags.get("ok").map(String::as_str), Some("value-1"));
        assert_eq!(parsed.tags.get("attempt").map(String::as_str), Some("3"));
        assert_eq!(parsed.tags, squad.tags());
        assert!(lines[0].contains("{[auth] attempt:3; ddSpanID:2; ddTraceID:1; ok:value-1;}"));
    }

    #[test_case("api} v1" ; "closing brace")]
    #[test_case("a;b" ; "semicolon")]
    #[test_case("" ; "empty")]
    fn invalid_layer_name_is_not_stamped(layer: &str) {
        let (logger, console) = captured_logger();
        let squad = logger.create_squad(Some(&TraceContext::new(1, 2)), layer);

        assert_eq!(squad.layer_name(), layer);
        assert!(!squad.tags().contains_key(TAG_LAYER_NAME));
        assert_eq!(squad.trace_context(), Some(TraceContext::new(1, 2)));

        squad.info("hi");
        let lines = console.stdout_lines();
        let parsed = ConsoleLine::parse(&lines[0]).expect("console shape");
        assert_eq!(parsed.tags, squad.tags());
        assert_eq!(parsed.message, "hi");
    }

    #[test]
    fn set_tag_is_not_blocked_by_emission() {
        let (logger, _) = captured_logger();
        let squad = Arc::new(logger.create_squad(None, "svc"));

        let writer = {
            let squad = squad.clone();
            std::thread::spawn(move || (0..200).all(|i| squad.set_tag("n", i)))
        };
        for i in 0..200 {
            squad.info_fmt(format_args!("event {i}"));
        }

        assert!(writer.join().expect("tagging thread"));
        assert_eq!(squad.tags().get("n").map(String::as_str), Some("199"));
    }

    #[test]
    fn squad_levels_route_like_logger() {
        let (logger, console) = captured_logger();
        let squad = logger.create_squad(None, "svc");

        squad.debug("d");
        squad.log_fmt(format_args!("l{}", 1));
        squad.info_fmt(format_args!("i{}", 2));
        squad.warn_fmt(format_args!("w{}", 3));
        squad.err_fmt(format_args!("e{}", 4));

        assert_eq!(console.stdout_lines().len(), 3);
        let errors = console.stderr_lines();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].ends_with("WARN: {} w3"));
        assert!(errors[1].contains("squad.rs:"));
        assert!(errors[1].ends_with(": e4"));
    }

    proptest! {
        #[test]
        fn prop_well_formed_tags_are_accepted(
            name in "[a-zA-Z0-9._-]{1,50}",
            value in "[a-zA-Z0-9 ~!@#$%^&*()_=+.,?:|/-]{1,255}",
        ) {
            prop_assume!(!is_reserved_tag(&name));
            let (logger, _) = captured_logger();
            let squad = logger.create_squad(None, "prop");
            prop_assert!(squad.set_tag(&name, &value));
            let tags = squad.tags();
            prop_assert_eq!(tags.get(&name), Some(&value));
        }

        #[test]
        fn prop_long_names_are_rejected(name in "[a-z]{51,80}") {
            prop_assert!(!is_valid_tag_name(&name));
        }

        #[test]
        fn prop_values_with_braces_are_rejected(prefix in "[a-z]{0,10}", brace in "[{};\\[\\]]") {
            let value = format!("{prefix}{brace}");
            prop_assert!(!is_valid_tag_value(&value));
        }
    }
}
