//! Interactive shell command parsing

use crate::{CliError, Result};
use schema::JobId;

/// One parsed line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Launch the given command line as a new job
    Run(String),
    /// Stop the job with the given id
    Stop(JobId),
    /// Print the current job table
    List,
    /// Print usage
    Help,
    /// Exit the shell (stopping every job on the way out)
    Quit,
}

/// Parse one line of user input
///
/// The remainder of a `run` line is passed to the shell verbatim, so
/// quoting, pipes, and redirects survive untouched.
pub fn parse_line(line: &str) -> Result<ShellCommand> {
    let trimmed = line.trim();
    let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    };

    match keyword {
        "run" => {
            if rest.is_empty() {
                Err(CliError::InvalidArgument("usage: run <command>".to_string()))
            } else {
                Ok(ShellCommand::Run(rest.to_string()))
            }
        }
        "stop" => rest.parse::<JobId>().map(ShellCommand::Stop).map_err(|_| {
            CliError::InvalidArgument(format!("'{}' is not a job id; usage: stop <id>", rest))
        }),
        "list" | "ls" => Ok(ShellCommand::List),
        "help" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(CliError::InvalidArgument(format!(
            "unknown command '{}'; type 'help'",
            other
        ))),
    }
}
