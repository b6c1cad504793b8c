//! Demo command implementation.
//!
//! Spawns concurrent workers. Each one gets its own squad seeded with a fresh
//! trace context and logs a short run of events through it.

use std::io::Write;
use std::time::Duration;

use squadlog::{Logger, TraceContext};

use crate::cli::DemoArgs;
use crate::error::CliError;

/// Handler for the demo command.
pub struct DemoCommand<'a> {
    logger: &'a Logger,
}

impl<'a> DemoCommand<'a> {
    /// Creates a new demo command handler.
    #[must_use]
    pub const fn new(logger: &'a Logger) -> Self {
        Self { logger }
    }

    /// Executes the demo command and returns the number of events emitted.
    ///
    /// # Errors
    ///
    /// Returns error if a worker task fails or the summary cannot be written.
    pub async fn execute<W: Write>(&self, out: &mut W, args: &DemoArgs) -> Result<usize, CliError> {
        let mut handles = Vec::with_capacity(args.workers);
        for worker in 0..args.workers {
            let logger = self.logger.clone();
            let events = args.events;
            handles.push(tokio::spawn(async move { run_worker(logger, worker, events).await }));
        }

        let mut emitted = 0;
        for handle in handles {
            emitted += handle.await.map_err(|e| CliError::Worker(e.to_string()))?;
        }

        writeln!(out, "{} workers emitted {emitted} events", args.workers)?;
        Ok(emitted)
    }
}

async fn run_worker(logger: Logger, worker: usize, events: usize) -> usize {
    let ctx = TraceContext::generate();
    let squad = logger.create_squad(Some(&ctx), "worker");
    squad.set_tag("worker", worker);

    squad.info_fmt(format_args!("worker {worker} started"));
    for step in 1..=events {
        squad.set_tag("step", step);
        match step % 4 {
            0 => squad.warn_fmt(format_args!("step {step} is slow")),
            _ => squad.log_fmt(format_args!("step {step} done")),
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    squad.info_fmt(format_args!("worker {worker} finished"));

    events + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadlog::{CapturedConsole, ConsoleInterceptor, ConsoleLine, Options, TAG_TRACE_ID};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_worker_gets_its_own_trace() {
        let console = Arc::new(CapturedConsole::new());
        let logger = Logger::new(Options::new().with_interceptor(Arc::new(
            ConsoleInterceptor::new().with_console(console.clone()),
        )));

        let mut out = Vec::new();
        let emitted = DemoCommand::new(&logger)
            .execute(&mut out, &DemoArgs { workers: 3, events: 4 })
            .await
            .expect("demo");

        assert_eq!(emitted, 18);
        assert_eq!(String::from_utf8_lossy(&out), "3 workers emitted 18 events\n");

        let lines: Vec<String> = console
            .stdout_lines()
            .into_iter()
            .chain(console.stderr_lines())
            .collect();
        assert_eq!(lines.len(), 18);

        let traces: HashSet<String> = lines
            .iter()
            .filter_map(|line| ConsoleLine::parse(line))
            .filter_map(|parsed| parsed.tags.get(TAG_TRACE_ID).cloned())
            .collect();
        assert_eq!(traces.len(), 3);
        assert_eq!(console.stderr_lines().len(), 3);
    }
}
