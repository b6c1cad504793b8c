//! Logger construction options.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;

use crate::clock::{utc_offset, Clock, SystemClock};
use crate::interceptor::{ConsoleInterceptor, Interceptor};
use crate::naming::DEFAULT_FILE_FORMAT;
use crate::types::{Mode, RuntimeMode};
use crate::writer::{FileOpener, FsOpener, WriterConfig, DEFAULT_FLUSH_INTERVAL};

/// Options a [`Logger`](crate::Logger) is built from.
///
/// Fixed once the logger exists; only the interceptor and the writing flag
/// can change afterwards, through the logger's setters.
#[derive(Clone)]
pub struct Options {
    /// Rotation granularity.
    pub mode: Mode,
    /// Directory for log files.
    pub path: PathBuf,
    /// Whether lines are persisted.
    pub writing: bool,
    /// File name template.
    pub file_format: String,
    /// Styling of the default console interceptor.
    pub runtime: RuntimeMode,
    /// Active interceptor. `None` selects a console interceptor.
    pub interceptor: Option<Arc<dyn Interceptor>>,
    /// Offset for timestamps and file names.
    pub utc_offset: FixedOffset,
    /// Pause between background flush cycles.
    pub flush_interval: Duration,
    /// Filesystem seam.
    pub opener: Arc<dyn FileOpener>,
    /// Time source. `None` selects the system clock in `utc_offset`.
    pub clock: Option<Arc<dyn Clock>>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .field("writing", &self.writing)
            .field("file_format", &self.file_format)
            .field("runtime", &self.runtime)
            .field("interceptor", &self.interceptor)
            .field("utc_offset", &self.utc_offset)
            .field("flush_interval", &self.flush_interval)
            .finish_non_exhaustive()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::Daily,
            path: PathBuf::from("logs"),
            writing: false,
            file_format: DEFAULT_FILE_FORMAT.to_string(),
            runtime: RuntimeMode::default(),
            interceptor: None,
            utc_offset: utc_offset(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            opener: Arc::new(FsOpener),
            clock: None,
        }
    }
}

impl Options {
    /// Creates default options: daily files under `logs`, writing off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the log directory.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Turns persistence on or off.
    #[must_use]
    pub const fn with_writing(mut self, writing: bool) -> Self {
        self.writing = writing;
        self
    }

    /// Sets the file name template. An empty template keeps the default.
    #[must_use]
    pub fn with_file_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if !format.is_empty() {
            self.file_format = format;
        }
        self
    }

    /// Sets the runtime mode of the default console interceptor.
    #[must_use]
    pub const fn with_runtime(mut self, runtime: RuntimeMode) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets the initial interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Sets the UTC offset.
    #[must_use]
    pub const fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Sets the pause between flush cycles.
    #[must_use]
    pub const fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Replaces the filesystem seam.
    #[must_use]
    pub fn with_opener(mut self, opener: Arc<dyn FileOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The time source these options resolve to.
    #[must_use]
    pub fn resolved_clock(&self) -> Arc<dyn Clock> {
        self.clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock::new(self.utc_offset)))
    }

    /// The interceptor these options resolve to.
    #[must_use]
    pub fn resolved_interceptor(&self) -> Arc<dyn Interceptor> {
        self.interceptor.clone().unwrap_or_else(|| {
            Arc::new(
                ConsoleInterceptor::new()
                    .with_runtime(self.runtime)
                    .with_clock(self.resolved_clock()),
            )
        })
    }

    pub(crate) fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            mode: self.mode,
            dir: self.path.clone(),
            file_format: self.file_format.clone(),
            flush_interval: self.flush_interval,
        }
    }
}
