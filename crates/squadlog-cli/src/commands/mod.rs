//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`emit`] - Single event, optionally through a squad
//! - [`demo`] - Concurrent workers with per-worker squads
//! - [`resolve`] - File name template resolution

pub mod demo;
pub mod emit;
pub mod resolve;

pub use demo::DemoCommand;
pub use emit::EmitCommand;
pub use resolve::ResolveCommand;
