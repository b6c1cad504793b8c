//! The logger core.
//!
//! A [`Logger`] renders every event through its active [`Interceptor`], lets
//! the interceptor dispatch the line, then queues the same line on its
//! [`Writer`]. Handles are cheap to clone and share one writer.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::interceptor::{Interceptor, TranslateArgs};
use crate::options::Options;
use crate::payload::{ErrorReport, Payload};
use crate::squad::Squad;
use crate::types::{ErrorLevel, Tags, TraceContext};
use crate::writer::Writer;

struct Inner {
    interceptor: RwLock<Arc<dyn Interceptor>>,
    writer: Arc<Writer>,
}

/// Interceptable logger with buffered file persistence.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("interceptor", &*self.inner.interceptor.read())
            .field("writer", &self.inner.writer)
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Logger {
    /// Builds an inert logger. Call [`Logger::startup`] before relying on
    /// persistence; console output works right away.
    #[must_use]
    pub fn new(options: Options) -> Self {
        let writer = Writer::new(
            options.writer_config(),
            options.writing,
            options.resolved_clock(),
            options.opener.clone(),
        );

        Self {
            inner: Arc::new(Inner {
                interceptor: RwLock::new(options.resolved_interceptor()),
                writer: Arc::new(writer),
            }),
        }
    }

    /// Opens the first log file and starts the background flusher.
    ///
    /// Idempotent: only the first call has any effect, even if it failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory or file cannot be created.
    pub fn startup(&self) -> Result<()> {
        self.inner.writer.boot()?;
        debug!(writing = self.is_writing(), "logger started");
        Ok(())
    }

    /// Returns true after a successful [`Logger::startup`], until shutdown.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.writer.is_ready()
    }

    /// Replaces the active interceptor.
    pub fn set_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        *self.inner.interceptor.write() = interceptor;
    }

    /// Returns the active interceptor.
    #[must_use]
    pub fn interceptor(&self) -> Arc<dyn Interceptor> {
        self.inner.interceptor.read().clone()
    }

    /// Creates a squad for one unit of work.
    ///
    /// With a trace context the squad starts with its layer name and trace
    /// ids as tags; without one it starts with no tags.
    #[must_use]
    pub fn create_squad(&self, ctx: Option<&TraceContext>, layer_name: impl Into<String>) -> Squad {
        Squad::new(self.clone(), ctx, layer_name.into())
    }

    /// The underlying writer.
    #[must_use]
    pub fn writer(&self) -> &Arc<Writer> {
        &self.inner.writer
    }

    /// Returns true if lines are persisted.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.inner.writer.is_writing()
    }

    /// Resumes persistence.
    pub fn start_writing(&self) {
        self.inner.writer.start_writing();
    }

    /// Pauses persistence. Queued lines are kept.
    pub fn stop_writing(&self) {
        self.inner.writer.stop_writing();
    }

    /// Path of the active log file.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.inner.writer.file_path()
    }

    /// Runs a flush cycle now and returns the number of lines persisted.
    pub fn flush(&self) -> Result<usize> {
        self.inner.writer.flush()
    }

    /// Stops the flusher and persists whatever is still queued.
    pub fn shutdown(&self) -> Result<usize> {
        let flushed = self.inner.writer.shutdown()?;
        debug!(flushed, "logger shut down");
        Ok(flushed)
    }

    /// Renders, dispatches and queues one event.
    pub(crate) fn dispatch(&self, level: ErrorLevel, tags: &Tags, payload: &Payload) {
        let interceptor = self.interceptor();
        let line = interceptor.translate(&TranslateArgs {
            level,
            tags,
            payload,
        });
        interceptor.process(level, &line);
        let _ = self.inner.writer.write(&line);
    }

    /// One last flush attempt, then exit.
    pub(crate) fn terminate(&self) -> ! {
        let _ = self.inner.writer.flush();
        std::process::exit(1)
    }

    fn emit(&self, level: ErrorLevel, payload: &Payload) {
        self.dispatch(level, &Tags::new(), payload);
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

    /// Emits at critical level, flushes once and exits the process with
    /// status 1.
    #[track_caller]
    pub fn fatal(&self, payload: impl Into<Payload>) -> ! {
        let payload: Payload = payload.into();
        let report = payload.into_report();
        self.emit(ErrorLevel::Critical, &Payload::Report(report));
        self.terminate()
    }
}
