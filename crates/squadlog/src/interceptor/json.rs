//! JSON rendering.
//!
//! Each event becomes one compact object:
//!
//! ```json
//! {"key":"api-1","name":"users","version":"1.4.0","level":"INFO",
//!  "timestamp":"2024-03-05T07:08:09+00:00","tags":{"user":"7"},"payload":"signed in"}
//! ```
//!
//! `tags` is left out when empty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{LogError, Result};
use crate::interceptor::{ConsoleInterceptor, Interceptor, TranslateArgs};
use crate::payload::Payload;
use crate::types::{ErrorLevel, Tags};

/// Identity stamped on every JSON record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOptions {
    /// Instance key, e.g. host or deployment id.
    pub key: String,
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
    /// Whether rendered records are also printed to the console.
    #[serde(default)]
    pub printing: bool,
}

impl JsonOptions {
    /// Checks that every identity field is set.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidOptions`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("key", &self.key), ("name", &self.name), ("version", &self.version)] {
            if value.trim().is_empty() {
                return Err(LogError::required(field));
            }
        }
        Ok(())
    }
}

/// One rendered JSON event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecord {
    /// Instance key.
    pub key: String,
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
    /// Upper-cased level name.
    pub level: String,
    /// When the event was rendered.
    pub timestamp: DateTime<FixedOffset>,
    /// Contextual tags.
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    /// The payload as JSON.
    pub payload: serde_json::Value,
}

impl JsonRecord {
    /// Parses a line produced by [`JsonInterceptor`].
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Serialization`] if the line is not a record.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Maps the level name back to a level.
    #[must_use]
    pub fn level(&self) -> Option<ErrorLevel> {
        self.level.parse().ok()
    }
}

#[derive(Serialize)]
struct RecordRef<'a> {
    key: &'a str,
    name: &'a str,
    version: &'a str,
    level: String,
    timestamp: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    tags: &'a Tags,
    payload: &'a Payload,
}

/// Renders events as JSON records.
#[derive(Debug)]
pub struct JsonInterceptor {
    options: JsonOptions,
    printing: AtomicBool,
    clock: Arc<dyn Clock>,
    console: ConsoleInterceptor,
}

impl JsonInterceptor {
    /// Creates a JSON interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidOptions`] if an identity field is empty.
    pub fn new(options: JsonOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            printing: AtomicBool::new(options.printing),
            options,
            clock: Arc::new(SystemClock::utc()),
            console: ConsoleInterceptor::new(),
        })
    }

    /// Sets the clock used for record timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the console used for printing and for render failure diagnostics.
    #[must_use]
    pub fn with_console(mut self, console: ConsoleInterceptor) -> Self {
        self.console = console;
        self
    }

    /// Returns the identity options.
    #[must_use]
    pub const fn options(&self) -> &JsonOptions {
        &self.options
    }

    /// Returns true if records are printed.
    #[must_use]
    pub fn is_printing(&self) -> bool {
        self.printing.load(Ordering::Acquire)
    }

    /// Starts printing records.
    pub fn start_printing(&self) {
        self.printing.store(true, Ordering::Release);
    }

    /// Stops printing records.
    pub fn stop_printing(&self) {
        self.printing.store(false, Ordering::Release);
    }

    /// Serializes one record. On failure a critical diagnostic goes through
    /// the console and the event is dropped.
    ///
    /// The built-in record shape always serializes; the fallback guards
    /// payload types added later.
    fn encode<T: Serialize>(&self, record: &T) -> String {
        match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                self.console.process(
                    ErrorLevel::Critical,
                    &format!("Failed parsing data, details: {e}"),
                );
                String::new()
            }
        }
    }
}

impl Interceptor for JsonInterceptor {
    fn translate(&self, args: &TranslateArgs<'_>) -> String {
        self.encode(&RecordRef {
            key: &self.options.key,
            name: &self.options.name,
            version: &self.options.version,
            level: args.level.as_str().to_uppercase(),
            timestamp: self.clock.now(),
            tags: args.tags,
            payload: args.payload,
        })
    }

    fn process(&self, level: ErrorLevel, line: &str) {
        if self.is_printing() {
            self.console.process(level, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::interceptor::CapturedConsole;
    use crate::squad::TAG_LAYER_NAME;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use test_case::test_case;

    fn options() -> JsonOptions {
        JsonOptions {
            key: "api-1".to_string(),
            name: "users".to_string(),
            version: "1.4.0".to_string(),
            printing: false,
        }
    }

    fn interceptor() -> (JsonInterceptor, Arc<CapturedConsole>) {
        let at = crate::clock::utc_offset()
            .with_ymd_and_hms(2024, 3, 5, 7, 8, 9)
            .single()
            .unwrap_or_else(|| unreachable!());
        let console = Arc::new(CapturedConsole::new());
        let json = JsonInterceptor::new(options())
            .unwrap_or_else(|e| panic!("valid options rejected: {e}"))
            .with_clock(Arc::new(FixedClock(at)))
            .with_console(ConsoleInterceptor::new().with_console(console.clone()));
        (json, console)
    }

    #[test]
    fn renders_fixed_shape_without_tags() {
        let (json, _) = interceptor();
        let payload = Payload::from("signed in");
        let line = json.translate(&TranslateArgs {
            level: ErrorLevel::Info,
            tags: &Tags::new(),
            payload: &payload,
        });
        assert_eq!(
            line,
            r#"{"key":"api-1","name":"users","version":"1.4.0","level":"INFO","timestamp":"2024-03-05T07:08:09+00:00","payload":"signed in"}"#
        );
    }

    #[test_case(ErrorLevel::Debug, "DEBUG")]
    #[test_case(ErrorLevel::Log, "LOG")]
    #[test_case(ErrorLevel::Warning, "WARN")]
    #[test_case(ErrorLevel::Critical, "CRITICAL")]
    fn upper_cases_level(level: ErrorLevel, expected: &str) {
        let (json, _) = interceptor();
        let payload = Payload::from("x");
        let line = json.translate(&TranslateArgs {
            level,
            tags: &Tags::new(),
            payload: &payload,
        });
        let record = JsonRecord::parse(&line);
        assert_eq!(record.as_ref().map(|r| r.level.as_str()).ok(), Some(expected));
        assert_eq!(record.ok().and_then(|r| r.level()), Some(level));
    }

    #[test]
    fn round_trips_level_tags_and_payload() {
        let (json, _) = interceptor();
        let mut tags = Tags::new();
        tags.insert(TAG_LAYER_NAME.to_string(), "repo".to_string());
        tags.insert("user".to_string(), "7".to_string());
        let payload = Payload::from(serde_json::json!({"rows": 3}));

        let line = json.translate(&TranslateArgs {
            level: ErrorLevel::Warning,
            tags: &tags,
            payload: &payload,
        });
        let record = JsonRecord::parse(&line).unwrap_or_else(|e| panic!("unparseable record: {e}"));

        assert_eq!(record.level(), Some(ErrorLevel::Warning));
        assert_eq!(record.tags, tags);
        assert_eq!(record.payload, serde_json::json!({"rows": 3}));
        assert_eq!(record.key, "api-1");
    }

    #[test]
    fn silent_unless_printing() {
        let (json, console) = interceptor();
        json.process(ErrorLevel::Info, "quiet");
        assert!(console.stdout_lines().is_empty());

        json.start_printing();
        assert!(json.is_printing());
        json.process(ErrorLevel::Info, "loud");
        json.process(ErrorLevel::Critical, "louder");
        assert_eq!(console.stdout_lines(), vec!["loud"]);
        assert_eq!(console.stderr_lines(), vec!["louder"]);

        json.stop_printing();
        json.process(ErrorLevel::Info, "quiet again");
        assert_eq!(console.stdout_lines().len(), 1);
    }

    #[test_case("", "users", "1.0", "key" ; "missing key")]
    #[test_case("k", " ", "1.0", "name" ; "blank name")]
    #[test_case("k", "users", "", "version" ; "missing version")]
    fn rejects_missing_identity(key: &str, name: &str, version: &str, field: &str) {
        let result = JsonInterceptor::new(JsonOptions {
            key: key.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            printing: false,
        });
        match result {
            Err(LogError::InvalidOptions { field: got, .. }) => assert_eq!(got, field),
            other => panic!("expected invalid options, got {other:?}"),
        }
    }

    /// A record whose serialization always fails.
    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("unsupported value"))
        }
    }

    #[test]
    fn render_failure_drops_event_and_reports() {
        let (json, console) = interceptor();
        assert_eq!(json.encode(&Broken), "");

        let errors = console.stderr_lines();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("Failed parsing data, details: unsupported value"));
        assert!(console.stdout_lines().is_empty());
    }

    proptest! {
        #[test]
        fn prop_translate_then_parse_recovers_event(
            level in prop::sample::select(ErrorLevel::ALL.to_vec()),
            tags in prop::collection::btree_map(
                "[a-zA-Z0-9._-]{1,50}",
                "[a-zA-Z0-9 ~!@#$%^&*()_=+.,?:|/-]{1,255}",
                0..6,
            ),
            text in "\\PC{0,80}",
        ) {
            let (json, _) = interceptor();
            let payload = Payload::from(text.clone());
            let line = json.translate(&TranslateArgs {
                level,
                tags: &tags,
                payload: &payload,
            });

            let record = JsonRecord::parse(&line);
            prop_assert!(record.is_ok());
            let record = record.unwrap_or_else(|e| panic!("unparseable record: {e}"));
            prop_assert_eq!(record.level(), Some(level));
            prop_assert_eq!(&record.tags, &tags);
            prop_assert_eq!(record.payload, serde_json::Value::String(text));
        }
    }

    #[test]
    fn options_deserialize_with_default_printing() {
        let parsed: std::result::Result<JsonOptions, _> =
            serde_json::from_str(r#"{"key":"k","name":"n","version":"v"}"#);
        assert_eq!(parsed.map(|o| o.printing).ok(), Some(false));
    }
}
