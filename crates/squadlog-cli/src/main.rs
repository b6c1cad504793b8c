//! squadlog CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use squadlog_cli::bootstrap;
use squadlog_cli::cli::{Cli, Commands};
use squadlog_cli::commands::{DemoCommand, EmitCommand, ResolveCommand};

fn main() -> ExitCode {
    // Internal diagnostics only; events go through the logger itself
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Resolve(args) = &cli.command {
        ResolveCommand::new(&cli).execute(&mut io::stdout().lock(), args)?;
        return Ok(());
    }

    let logger = bootstrap::default_logger(&cli).context("building logger")?;

    match &cli.command {
        Commands::Emit(args) => EmitCommand::new(&logger).execute(args)?,
        Commands::Demo(args) => {
            DemoCommand::new(&logger)
                .execute(&mut io::stdout(), args)
                .await?;
        }
        Commands::Resolve(_) => {}
    }

    logger.shutdown().context("flushing logs")?;
    Ok(())
}
