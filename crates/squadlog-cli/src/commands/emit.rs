//! Emit command implementation.

use squadlog::{ErrorLevel, Logger, Payload, TraceContext};

use crate::cli::EmitArgs;
use crate::error::CliError;

/// Handler for the emit command.
pub struct EmitCommand<'a> {
    logger: &'a Logger,
}

impl<'a> EmitCommand<'a> {
    /// Creates a new emit command handler.
    #[must_use]
    pub const fn new(logger: &'a Logger) -> Self {
        Self { logger }
    }

    /// Executes the emit command.
    ///
    /// # Errors
    ///
    /// Returns an error if a tag is rejected.
    pub fn execute(&self, args: &EmitArgs) -> Result<(), CliError> {
        let payload = Payload::from(args.message.join(" "));

        let Some(layer) = &args.layer else {
            emit(self.logger, args.level, payload);
            return Ok(());
        };

        let ctx = args.trace.then(TraceContext::generate);
        let squad = self.logger.create_squad(ctx.as_ref(), layer.as_str());
        for (name, value) in &args.tag {
            if !squad.set_tag(name, value) {
                return Err(CliError::InvalidArgument(format!("tag `{name}` was rejected")));
            }
        }

        match args.level {
            ErrorLevel::Debug => squad.debug(payload),
            ErrorLevel::Log => squad.log(payload),
            ErrorLevel::Info => squad.info(payload),
            ErrorLevel::Warning => squad.warn(payload),
            ErrorLevel::Critical => squad.err(payload),
        }
        Ok(())
    }
}

fn emit(logger: &Logger, level: ErrorLevel, payload: Payload) {
    match level {
        ErrorLevel::Debug => logger.debug(payload),
        ErrorLevel::Log => logger.log(payload),
        ErrorLevel::Info => logger.info(payload),
        ErrorLevel::Warning => logger.warn(payload),
        ErrorLevel::Critical => logger.err(payload),
    }
}
