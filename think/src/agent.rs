//! Agent collaborator seam between the REPL and the language model.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::exec::ExecutionRecord;

/// One composing-mode turn delivered to the agent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Turn {
    /// Trimmed user message.
    pub message: String,
    /// Whether a command has been run since the session started.
    pub command_was_run: bool,
    /// Fully-qualified text of the last invocation (`shell -c line`).
    pub actual_command: String,
    /// Captured stdout tail of the last run.
    pub stdout: String,
    /// Captured stderr tail of the last run.
    pub stderr: String,
    /// Exit code of the last run.
    pub exit_code: i32,
    /// Whether the session forwards captured output to the model.
    pub send_output: bool,
}

impl Turn {
    /// Build a turn from the user's message and the most recent execution.
    pub fn new(message: &str, last_run: &ExecutionRecord, send_output: bool) -> Self {
        Self {
            message: message.trim().to_string(),
            command_was_run: last_run.ran,
            actual_command: last_run.command.clone(),
            stdout: last_run.stdout_tail.clone(),
            stderr: last_run.stderr_tail.clone(),
            exit_code: last_run.exit_code,
            send_output,
        }
    }
}

/// Abstraction over the language-model backend.
///
/// [`listen`](Agent::listen) records a user turn; [`respond`](Agent::respond)
/// produces the model reply, echoing chunks to `sink` as they arrive and
/// returning the full text once the stream completes. Tests use scripted
/// implementations; [`crate::client::ChatAgent`] is the HTTP one.
pub trait Agent {
    fn listen(&mut self, turn: &Turn) -> Result<()>;
    fn respond(&mut self, sink: &mut dyn Write) -> Result<String>;
}

/// Extract the proposed shell command from a model reply: the last non-empty
/// line, or `None` when the reply contains none.
pub fn proposed_command(response: &str) -> Option<String> {
    response
        .lines()
        .rev()
        .map(|line| line.trim_end_matches('\r'))
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_nonempty_line() {
        let reply = "Explanation...\n\nls -la\n\n";
        assert_eq!(proposed_command(reply), Some("ls -la".to_string()));
    }

    #[test]
    fn single_line_reply_is_the_command() {
        assert_eq!(proposed_command("pwd"), Some("pwd".to_string()));
    }

    #[test]
    fn blank_reply_yields_nothing() {
        assert_eq!(proposed_command(""), None);
        assert_eq!(proposed_command("\n\n\n"), None);
    }

    #[test]
    fn carriage_returns_are_stripped() {
        assert_eq!(
            proposed_command("explained\r\n\r\necho hi\r\n"),
            Some("echo hi".to_string())
        );
    }

    #[test]
    fn turn_carries_execution_metadata() {
        let record = ExecutionRecord {
            command: "/bin/sh -c true".to_string(),
            ran: true,
            stdout_tail: "out".to_string(),
            stderr_tail: String::new(),
            exit_code: 0,
        };
        let turn = Turn::new("  next task  ", &record, true);

        assert_eq!(turn.message, "next task");
        assert!(turn.command_was_run);
        assert_eq!(turn.actual_command, "/bin/sh -c true");
        assert_eq!(turn.stdout, "out");
        assert!(turn.send_output);
    }
}
