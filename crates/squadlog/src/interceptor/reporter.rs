//! External error reporting.
//!
//! [`ReporterInterceptor`] renders and routes exactly like the console
//! interceptor, then forwards lines at or above a threshold to a
//! [`ReportSink`]. Delivery is fire-and-forget: sinks return nothing and the
//! logger never waits on them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::interceptor::{strip_ansi, ConsoleInterceptor, Interceptor, TranslateArgs};
use crate::types::ErrorLevel;

fn default_environment() -> String {
    "local".to_string()
}

/// Reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterOptions {
    /// Server host reported with every item.
    pub key: String,
    /// Service name.
    pub name: String,
    /// Sink access token.
    pub token: String,
    /// Code version reported with every item.
    pub version: String,
    /// Lowest level forwarded to the sink.
    pub level: ErrorLevel,
    /// Deployment environment reported with every item.
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ReporterOptions {
    /// Creates options with the `local` environment.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        token: impl Into<String>,
        version: impl Into<String>,
        level: ErrorLevel,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            token: token.into(),
            version: version.into(),
            level,
            environment: default_environment(),
        }
    }

    /// Sets the deployment environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Checks that every required field is set.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidOptions`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("key", &self.key),
            ("name", &self.name),
            ("token", &self.token),
            ("version", &self.version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(LogError::required(field));
            }
        }
        Ok(())
    }
}

/// Severity understood by report sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    /// Debug item.
    Debug,
    /// Informational item.
    Info,
    /// Warning item.
    Warning,
    /// Critical item.
    Critical,
}

impl From<ErrorLevel> for ReportLevel {
    fn from(level: ErrorLevel) -> Self {
        match level {
            ErrorLevel::Debug | ErrorLevel::Log => Self::Debug,
            ErrorLevel::Info => Self::Info,
            ErrorLevel::Warning => Self::Warning,
            ErrorLevel::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// One item handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Report<'a> {
    /// Mapped severity.
    pub level: ReportLevel,
    /// Rendered line without terminal styling.
    pub message: &'a str,
    /// Service name.
    pub name: &'a str,
    /// Code version.
    pub code_version: &'a str,
    /// Server host.
    pub server_host: &'a str,
    /// Deployment environment.
    pub environment: &'a str,
}

/// Destination for reported items.
pub trait ReportSink: Send + Sync + fmt::Debug {
    /// Delivers one item. Failures are the sink's own business.
    fn send(&self, report: &Report<'_>);
}

/// Sink that re-emits items as `tracing` events under the `squadlog::report`
/// target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn send(&self, report: &Report<'_>) {
        let Report {
            level,
            message,
            name,
            code_version,
            server_host,
            environment,
        } = *report;

        match level {
            ReportLevel::Debug => tracing::debug!(
                target: "squadlog::report",
                service = name,
                code_version,
                server_host,
                environment,
                "{message}"
            ),
            ReportLevel::Info => tracing::info!(
                target: "squadlog::report",
                service = name,
                code_version,
                server_host,
                environment,
                "{message}"
            ),
            ReportLevel::Warning => tracing::warn!(
                target: "squadlog::report",
                service = name,
                code_version,
                server_host,
                environment,
                "{message}"
            ),
            ReportLevel::Critical => tracing::error!(
                target: "squadlog::report",
                service = name,
                code_version,
                server_host,
                environment,
                "{message}"
            ),
        }
    }
}

/// Console interceptor that also forwards to a report sink.
#[derive(Debug)]
pub struct ReporterInterceptor {
    options: ReporterOptions,
    enabled: AtomicBool,
    sink: Arc<dyn ReportSink>,
    console: ConsoleInterceptor,
}

impl ReporterInterceptor {
    /// Creates an enabled reporter.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidOptions`] if a required option is empty.
    pub fn new(
        options: ReporterOptions,
        sink: Arc<dyn ReportSink>,
        console: ConsoleInterceptor,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            enabled: AtomicBool::new(true),
            sink,
            console,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn options(&self) -> &ReporterOptions {
        &self.options
    }

    /// Returns true if items are being forwarded.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Resumes forwarding.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Stops forwarding. Console routing continues.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    fn forwards(&self, level: ErrorLevel) -> bool {
        self.is_enabled() && level.is_at_least(self.options.level)
    }
}

impl Interceptor for ReporterInterceptor {
    fn translate(&self, args: &TranslateArgs<'_>) -> String {
        self.console.translate(args)
    }

    fn process(&self, level: ErrorLevel, line: &str) {
        self.console.process(level, line);

        if line.is_empty() || !self.forwards(level) {
            return;
        }

        let message = strip_ansi(line);
        self.sink.send(&Report {
            level: level.into(),
            message: &message,
            name: &self.options.name,
            code_version: &self.options.version,
            server_host: &self.options.key,
            environment: &self.options.environment,
        });
    }
}
