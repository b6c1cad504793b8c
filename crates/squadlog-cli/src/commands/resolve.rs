//! Resolve command implementation.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use squadlog::resolve_file_name;

use crate::cli::{Cli, ResolveArgs};
use crate::error::CliError;

/// Handler for the resolve command.
pub struct ResolveCommand<'a> {
    cli: &'a Cli,
}

impl<'a> ResolveCommand<'a> {
    /// Creates a new resolve command handler.
    #[must_use]
    pub const fn new(cli: &'a Cli) -> Self {
        Self { cli }
    }

    /// Executes the resolve command and returns the resolved path.
    ///
    /// # Errors
    ///
    /// Returns error if `--at` is not RFC 3339 or output fails.
    pub fn execute<W: Write>(&self, out: &mut W, args: &ResolveArgs) -> Result<PathBuf, CliError> {
        let now = match &args.at {
            Some(at) => DateTime::parse_from_rfc3339(at)
                .map_err(|e| CliError::InvalidArgument(format!("--at `{at}`: {e}")))?,
            None => Utc::now().fixed_offset(),
        };
        let now: DateTime<FixedOffset> = now.with_timezone(&self.cli.utc_offset);

        let name = resolve_file_name(&self.cli.file_format, self.cli.mode, &now);
        let path = self.cli.log_dir.join(name);
        writeln!(out, "{}", path.display())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Commands;

    fn resolve(argv: &[&str]) -> Result<String, CliError> {
        let cli = Cli::parse_from(argv);
        let Commands::Resolve(args) = &cli.command else {
            panic!("expected resolve");
        };
        let mut out = Vec::new();
        ResolveCommand::new(&cli).execute(&mut out, args)?;
        Ok(String::from_utf8_lossy(&out).trim_end().to_string())
    }

    #[test]
    fn resolves_daily_name() {
        let path = resolve(&["squadlog", "--log-dir", "logs", "resolve", "--at", "2024-03-05T07:08:09Z"]);
        assert_eq!(path.expect("resolve"), "logs/log-20240305.log");
    }

    #[test]
    fn applies_utc_offset_before_resolving() {
        let path = resolve(&[
            "squadlog",
            "--utc-offset",
            "+07:00",
            "--log-dir",
            "logs",
            "resolve",
            "--at",
            "2024-03-05T20:00:00Z",
        ]);
        assert_eq!(path.expect("resolve"), "logs/log-20240306.log");
    }

    #[test]
    fn custom_template_and_mode() {
        let path = resolve(&[
            "squadlog",
            "--log-dir",
            "out",
            "--mode",
            "yearly",
            "--file-format",
            "app-%v-%h%i.log",
            "resolve",
            "--at",
            "2024-03-05T07:08:09Z",
        ]);
        assert_eq!(path.expect("resolve"), "out/app-2024-0708.log");
    }

    #[test]
    fn rejects_bad_instant() {
        let result = resolve(&["squadlog", "resolve", "--at", "yesterday"]);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }
}
