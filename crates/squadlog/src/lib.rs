//! # squadlog
//!
//! Interceptable, in-process logging with buffered file persistence.
//!
//! This crate provides:
//!
//! - [`Logger`] - Renders events through an interceptor and queues them for disk
//! - [`Squad`] - Tagged sub-logger created per unit of work
//! - [`Interceptor`] - Pluggable rendering/dispatch: [`ConsoleInterceptor`],
//!   [`JsonInterceptor`], [`ReporterInterceptor`]
//! - [`Writer`] - Line queue flushed by a background thread, rotating files
//!   by [`Mode`]
//! - [`Payload`], [`ErrorReport`] - What callers log
//!
//! ## Example
//!
//! ```rust
//! use squadlog::{Logger, Options, TraceContext};
//!
//! let logger = Logger::new(Options::new());
//! logger.startup().expect("writing is off, nothing to open");
//!
//! let squad = logger.create_squad(Some(&TraceContext::generate()), "handler");
//! squad.set_tag("route", "/v1/users");
//! squad.info("request accepted");
//! squad.warn_fmt(format_args!("took {} ms", 812));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod interceptor;
pub mod logger;
pub mod naming;
pub mod options;
pub mod payload;
pub mod squad;
pub mod types;
pub mod writer;

pub use clock::{parse_utc_offset, Clock, FixedClock, SystemClock};
pub use error::{LogError, Result};
pub use interceptor::{
    CapturedConsole, Console, ConsoleInterceptor, ConsoleLine, Interceptor, JsonInterceptor,
    JsonOptions, JsonRecord, Report, ReportLevel, ReportSink, ReporterInterceptor, ReporterOptions,
    StdConsole, TracingSink, TranslateArgs,
};
pub use logger::Logger;
pub use naming::{resolve_file_name, rotation_key, DEFAULT_FILE_FORMAT};
pub use options::Options;
pub use payload::{ErrorReport, Failure, Origin, Payload};
pub use squad::{Squad, TAG_LAYER_NAME, TAG_SPAN_ID, TAG_TRACE_ID};
pub use types::{ErrorLevel, Mode, RuntimeMode, Tags, TraceContext};
pub use writer::{FileOpener, FsOpener, LogFile, Writer, WriterConfig, DEFAULT_FLUSH_INTERVAL};
