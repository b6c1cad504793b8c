//! Builds the process-wide logger from command-line options.
//!
//! Startup is best-effort: if the log file cannot be opened the failure is
//! logged to stderr and the logger carries on without persistence.

use std::sync::Arc;

use squadlog::{
    ConsoleInterceptor, ErrorReport, Interceptor, JsonInterceptor, JsonOptions, Logger, Options,
    ReporterInterceptor, ReporterOptions, RuntimeMode, SystemClock, TracingSink,
};

use crate::cli::{Cli, Output};
use crate::error::CliError;

/// Builds logger options from the parsed arguments.
///
/// # Errors
///
/// Returns an error if JSON or reporter options are incomplete.
pub fn options(cli: &Cli) -> Result<Options, CliError> {
    let runtime = RuntimeMode::from_env_name(&cli.environment);
    let clock = Arc::new(SystemClock::new(cli.utc_offset));
    let console = ConsoleInterceptor::new()
        .with_runtime(runtime)
        .with_clock(clock.clone());

    let interceptor: Arc<dyn Interceptor> = match (cli.output, cli.report_level) {
        (Output::Json, _) => Arc::new(
            JsonInterceptor::new(JsonOptions {
                key: cli.key.clone(),
                name: cli.name.clone(),
                version: cli.app_version.clone(),
                printing: true,
            })?
            .with_clock(clock.clone())
            .with_console(console),
        ),
        (Output::Console, Some(level)) => Arc::new(ReporterInterceptor::new(
            ReporterOptions::new(
                cli.key.clone(),
                cli.name.clone(),
                cli.report_token.clone(),
                cli.app_version.clone(),
                level,
            )
            .with_environment(cli.environment.clone()),
            Arc::new(TracingSink),
            console,
        )?),
        (Output::Console, None) => Arc::new(console),
    };

    Ok(Options::new()
        .with_mode(cli.mode)
        .with_path(cli.log_dir.clone())
        .with_file_format(cli.file_format.clone())
        .with_writing(cli.write)
        .with_runtime(runtime)
        .with_utc_offset(cli.utc_offset)
        .with_clock(clock)
        .with_interceptor(interceptor))
}

/// Starts the logger. On failure, reports the error through the logger
/// itself and disables writing.
///
/// Returns true if persistence is active.
pub fn start(logger: &Logger) -> bool {
    match logger.startup() {
        Ok(()) => logger.is_writing(),
        Err(e) => {
            logger.err(ErrorReport::from_error(&e).with_comment("Failed to start log writer"));
            logger.stop_writing();
            false
        }
    }
}

/// Builds and starts the default logger.
///
/// # Errors
///
/// Returns an error if the options are invalid. Startup failures are not
/// errors, see [`start`].
pub fn default_logger(cli: &Cli) -> Result<Logger, CliError> {
    let logger = Logger::new(options(cli)?);
    let persisting = start(&logger);
    tracing::debug!(persisting, dir = %cli.log_dir.display(), "logger ready");
    Ok(logger)
}
