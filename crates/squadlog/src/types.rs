//! Core types shared by the logger, writer, squads and interceptors.
//!
//! This module provides:
//! - [`ErrorLevel`] - Severity levels, ordered from least to most severe
//! - [`Mode`] - Rotation granularity for log file names
//! - [`RuntimeMode`] - Whether console output is styled for a local terminal
//! - [`Tags`] - Tag map carried by squads
//! - [`TraceContext`] - Distributed trace identity used to seed squads

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag name → tag value map attached to events emitted through a squad.
pub type Tags = BTreeMap<String, String>;

/// Severity of a log event.
///
/// The total order `Debug < Log < Info < Warning < Critical` drives gating
/// decisions such as the reporter threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorLevel {
    /// Debugging detail.
    #[serde(rename = "debug")]
    Debug,
    /// Routine log output.
    #[serde(rename = "log")]
    Log,
    /// Informational event.
    #[serde(rename = "info")]
    Info,
    /// Something looks wrong but the operation continued.
    #[serde(rename = "warn")]
    Warning,
    /// An operation failed.
    #[serde(rename = "critical")]
    Critical,
}

impl ErrorLevel {
    /// All levels, least severe first.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Log,
        Self::Info,
        Self::Warning,
        Self::Critical,
    ];

    /// Returns the wire name of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Log => "log",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Critical => "critical",
        }
    }

    /// Returns true if this level is at least as severe as `threshold`.
    #[must_use]
    pub fn is_at_least(&self, threshold: Self) -> bool {
        *self >= threshold
    }

    /// Returns true for levels routed to standard error by default.
    #[must_use]
    pub const fn is_error_stream(&self) -> bool {
        matches!(self, Self::Warning | Self::Critical)
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "log" => Ok(Self::Log),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "critical" | "err" | "error" => Ok(Self::Critical),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Time granularity used to compute the active log file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One file per calendar day.
    #[default]
    Daily,
    /// One file per calendar month.
    Monthly,
    /// One file per calendar year.
    Yearly,
    /// A single file forever.
    Permanent,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "permanent" => Ok(Self::Permanent),
            other => Err(format!("unknown rotation mode: {other}")),
        }
    }
}

/// Environment the process runs in, as far as console styling is concerned.
///
/// `Local` keeps ANSI colours and multi-line messages. Everything else strips
/// colours and folds newlines so each event stays on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Developer machine attached to a terminal.
    Local,
    /// Any deployed environment.
    #[default]
    Deployed,
}

impl RuntimeMode {
    /// Maps an `APP_ENV`-style environment name onto a runtime mode.
    #[must_use]
    pub fn from_env_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("local") {
            Self::Local
        } else {
            Self::Deployed
        }
    }

    /// Returns true in local mode.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Trace and span identity of the unit of work a squad belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceContext {
    /// Identifier shared by every span of one trace.
    pub trace_id: u64,
    /// Identifier of the current span.
    pub span_id: u64,
}

impl TraceContext {
    /// Creates a context from known ids.
    #[must_use]
    pub const fn new(trace_id: u64, span_id: u64) -> Self {
        Self { trace_id, span_id }
    }

    /// Creates a fresh root context with random ids.
    #[must_use]
    pub fn generate() -> Self {
        let (trace_id, span_id) = Uuid::new_v4().as_u64_pair();
        Self { trace_id, span_id }
    }

    /// Creates a child context: same trace, new span.
    #[must_use]
    pub fn child(&self) -> Self {
        let (_, span_id) = Uuid::new_v4().as_u64_pair();
        Self {
            trace_id: self.trace_id,
            span_id,
        }
    }
}
