//! # squadlog-cli
//!
//! Command-line front end for the `squadlog` logging core.
//!
//! This is the composition point: it reads `APP_*` environment variables and
//! flags, builds the process-wide [`squadlog::Logger`] and starts it on a
//! best-effort basis (see [`bootstrap`]).
//!
//! Provides commands for:
//! - Emitting single events, directly or through a tagged squad
//! - Running concurrent workers that each log through their own squad
//! - Resolving the log file name template for an instant

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Commands, DemoArgs, EmitArgs, Output, ResolveArgs};
pub use error::CliError;
