//! Time source used for timestamps and file name resolution.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

/// Source of the current time in the logger's configured offset.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock reporting time in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Creates a clock reporting in the given offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Creates a clock reporting in UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(utc_offset())
    }

    /// Returns the configured offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at one instant, for golden output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Returns the zero offset.
#[must_use]
pub fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!())
}

/// Parses an offset written as `+HH:MM`, `-HH:MM`, `+HHMM`, `Z` or `UTC`.
///
/// # Errors
///
/// Returns a description of the problem if the input is not a valid offset.
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset, String> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("z") || input.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }

    input
        .parse::<FixedOffset>()
        .map_err(|e| format!("invalid UTC offset `{input}`: {e}"))
}
