//! Event payloads.
//!
//! A [`Payload`] is whatever a caller hands to a level method. Interceptors
//! decide how to render it; the logger itself never looks inside.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Source location an error was raised from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Enclosing function, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Source file.
    pub file: String,
    /// Line in `file`.
    pub line: u32,
}

impl Origin {
    /// Captures the location of the caller.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            function: None,
            file: location.file().to_string(),
            line: location.line(),
        }
    }

    /// Sets the enclosing function name.
    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(f, "{function} @ {}:{}", self.file, self.line),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// A classified error carrying its origin and context comments.
///
/// Interceptors render reports verbatim through [`ErrorReport::plain`] and
/// [`ErrorReport::colored`] instead of generic stringification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// The underlying error message.
    pub message: String,
    /// Context added on the way up, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Where the report was created.
    pub origin: Origin,
}

impl ErrorReport {
    /// Creates a report located at the caller.
    #[must_use]
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            comments: Vec::new(),
            origin: Origin::caller(),
        }
    }

    /// Creates a report from an error, keeping its source chain as comments.
    #[must_use]
    #[track_caller]
    pub fn from_error<E: StdError + ?Sized>(err: &E) -> Self {
        let mut report = Self::new(err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            report.message = format!("{}: {cause}", report.message);
            source = cause.source();
        }
        report
    }

    /// Adds a context comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Records the enclosing function name.
    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.origin = self.origin.with_function(function);
        self
    }

    /// Plain single-style rendering: `origin: comment: message`.
    #[must_use]
    pub fn plain(&self) -> String {
        let mut out = format!("{}: ", self.origin);
        for comment in &self.comments {
            out.push_str(comment);
            out.push_str(": ");
        }
        out.push_str(&self.message);
        out
    }

    /// Terminal rendering with ANSI styling.
    #[must_use]
    pub fn colored(&self) -> String {
        let mut out = format!("{}: ", self.origin.to_string().cyan());
        for comment in &self.comments {
            out.push_str(&comment.yellow().to_string());
            out.push_str(": ");
        }
        out.push_str(&self.message.red().to_string());
        out
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain())
    }
}

/// An unclassified error, captured together with the caller's location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// The error message.
    pub message: String,
    /// Where the error was handed to the logger.
    pub origin: Origin,
}

impl Failure {
    /// `function @ file:line: message`.
    #[must_use]
    pub fn plain(&self) -> String {
        format!("{}: {}", self.origin, self.message)
    }

    /// Styled variant of [`Failure::plain`].
    #[must_use]
    pub fn colored(&self) -> String {
        format!("{}: {}", self.origin.to_string().cyan(), self.message.red())
    }
}

/// Payload of a single log event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Free text.
    Text(String),
    /// Structured data.
    Value(serde_json::Value),
    /// A classified error report.
    Report(ErrorReport),
    /// A generic error with its capture location.
    Failure(Failure),
}

impl Payload {
    /// Wraps a generic error, recording the caller's location.
    #[must_use]
    #[track_caller]
    pub fn error<E: StdError + ?Sized>(err: &E) -> Self {
        Self::Failure(Failure {
            message: err.to_string(),
            origin: Origin::caller(),
        })
    }

    /// Generic rendering used when no special-casing applies.
    #[must_use]
    pub fn display_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Value(value) => value.to_string(),
            Self::Report(report) => report.plain(),
            Self::Failure(failure) => failure.message.clone(),
        }
    }

    /// Promotes the payload into an error report.
    ///
    /// Payloads that are not already reports are located at the caller.
    #[must_use]
    #[track_caller]
    pub fn into_report(self) -> ErrorReport {
        match self {
            Self::Report(report) => report,
            Self::Failure(failure) => ErrorReport {
                message: failure.message,
                comments: Vec::new(),
                origin: failure.origin,
            },
            other => ErrorReport::new(other.display_string()),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Payload {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<fmt::Arguments<'_>> for Payload {
    fn from(value: fmt::Arguments<'_>) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<ErrorReport> for Payload {
    fn from(value: ErrorReport) -> Self {
        Self::Report(value)
    }
}

impl From<Failure> for Payload {
    fn from(value: Failure) -> Self {
        Self::Failure(value)
    }
}

/// Builds an [`ErrorReport`] from format arguments, recording the caller's
/// file, line and enclosing function.
///
/// ```
/// let report = squadlog::report!("user {} not found", 42);
/// assert!(report.plain().ends_with("user 42 not found"));
/// ```
#[macro_export]
macro_rules! report {
    ($($arg:tt)+) => {
        $crate::ErrorReport::new(::std::format!($($arg)+))
            .with_function($crate::__function_name!())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk full")
        }
    }

    impl StdError for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("write failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn origin_captures_this_file() {
        let origin = Origin::caller();
        assert!(origin.file.ends_with("payload.rs"));
        assert!(origin.line > 0);
        assert!(origin.function.is_none());
    }

    #[test]
    fn origin_display_with_function() {
        let origin = Origin {
            function: Some("svc::login".to_string()),
            file: "src/svc.rs".to_string(),
            line: 12,
        };
        assert_eq!(origin.to_string(), "svc::login @ src/svc.rs:12");
    }

    #[test]
    fn report_plain_includes_comments() {
        let report = ErrorReport::new("connection refused").with_comment("failed to load user");
        let plain = report.plain();
        assert!(plain.contains("payload.rs:"));
        assert!(plain.ends_with(": failed to load user: connection refused"));
    }

    #[test]
    fn report_from_error_flattens_sources() {
        let report = ErrorReport::from_error(&Outer(Inner));
        assert_eq!(report.message, "write failed: disk full");
    }

    #[test]
    fn report_macro_records_function() {
        let report = crate::report!("user {} missing", 7);
        assert_eq!(report.message, "user 7 missing");
        let function = report.origin.function.clone().unwrap_or_default();
        assert!(function.ends_with("report_macro_records_function"));
        assert!(report.plain().contains(" @ "));
    }

    #[test]
    fn payload_error_renders_origin() {
        let payload = Payload::error(&Inner);
        match payload {
            Payload::Failure(failure) => {
                assert_eq!(failure.message, "disk full");
                assert!(failure.plain().ends_with(": disk full"));
                assert!(failure.origin.file.ends_with("payload.rs"));
            }
            other => panic!("expected failure payload, got {other:?}"),
        }
    }

    #[test]
    fn payload_display_string() {
        assert_eq!(Payload::from("hello").display_string(), "hello");
        assert_eq!(
            Payload::from(serde_json::json!({"a": 1})).display_string(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn payload_into_report_keeps_existing_report() {
        let report = ErrorReport::new("boom");
        let origin = report.origin.clone();
        let promoted = Payload::from(report).into_report();
        assert_eq!(promoted.origin, origin);
        assert_eq!(promoted.message, "boom");
    }

    #[test]
    fn payload_into_report_locates_text() {
        let promoted = Payload::from("plain text").into_report();
        assert_eq!(promoted.message, "plain text");
        assert!(promoted.origin.file.ends_with("payload.rs"));
    }

    #[test]
    fn payload_serializes_untagged() {
        let text = serde_json::to_string(&Payload::from("hi")).unwrap_or_default();
        assert_eq!(text, "\"hi\"");

        let report = ErrorReport {
            message: "boom".to_string(),
            comments: Vec::new(),
            origin: Origin {
                function: None,
                file: "a.rs".to_string(),
                line: 3,
            },
        };
        let json = serde_json::to_value(Payload::from(report)).unwrap_or_default();
        assert_eq!(json["message"], "boom");
        assert_eq!(json["origin"]["line"], 3);
        assert!(json.get("comments").is_none());
    }
}
