//! Two-state REPL: compose a task for the model, then review and run the
//! command it proposes.
//!
//! The loop reads one line at a time. In composing mode the line becomes an
//! agent turn and the reply's last non-empty line is preloaded into the edit
//! buffer for review. In reviewing mode a non-empty line is executed through
//! the shell and its captured output feeds the next turn; an empty line,
//! interrupt, or end-of-input cancels the review instead.

use std::io;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::agent::{Agent, Turn, proposed_command};
use crate::editor::{LineReader, ReadEvent};
use crate::exec::{self, ExecutionRecord};

/// Which prompt the loop is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Describing a task for the model.
    Composing,
    /// Editing or running the proposed command.
    Reviewing,
}

/// Session options resolved by the CLI before the loop starts.
#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub shell_path: String,
    pub send_output: bool,
    /// Preloaded into the first composing read, as if typed.
    pub initial_input: String,
    pub composing_prompt: String,
    pub reviewing_prompt: String,
}

/// The REPL state machine. Owns the session state (mode and the most recent
/// execution record) for its entire lifetime.
pub struct Repl<R: LineReader, A: Agent> {
    reader: R,
    agent: A,
    options: ReplOptions,
    mode: Mode,
    last_run: ExecutionRecord,
}

impl<R: LineReader, A: Agent> Repl<R, A> {
    pub fn new(reader: R, agent: A, options: ReplOptions) -> Self {
        Self {
            reader,
            agent,
            options,
            mode: Mode::Composing,
            last_run: ExecutionRecord::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn last_run(&self) -> &ExecutionRecord {
        &self.last_run
    }

    /// Drive the loop until end-of-input arrives in composing mode.
    ///
    /// Read errors other than interrupt/end-of-input, agent errors, and
    /// preload errors are fatal and propagate to the caller.
    pub fn run(&mut self) -> Result<()> {
        self.enter_composing();
        if !self.options.initial_input.is_empty() {
            let initial = self.options.initial_input.clone();
            self.reader
                .preload(&initial)
                .context("preload initial input")?;
        }

        loop {
            match self.reader.read_line()? {
                ReadEvent::Interrupted => {
                    if self.mode == Mode::Reviewing {
                        debug!("review interrupted, discarding proposed command");
                        self.enter_composing();
                    }
                }
                ReadEvent::Eof => {
                    if self.mode == Mode::Reviewing {
                        self.enter_composing();
                    } else {
                        info!("end of input");
                        return Ok(());
                    }
                }
                ReadEvent::Line(line) => match self.mode {
                    Mode::Reviewing => self.review(&line)?,
                    Mode::Composing => self.compose(&line)?,
                },
            }
        }
    }

    /// Reviewing-mode line: run it, or discard the proposal when empty.
    /// Either way the next read happens in composing mode.
    fn review(&mut self, line: &str) -> Result<()> {
        if line.is_empty() {
            debug!("empty review line, discarding proposed command");
        } else {
            self.last_run = exec::run_shell(&self.options.shell_path, line)?;
        }
        self.enter_composing();
        Ok(())
    }

    /// Composing-mode line: deliver a turn (empty messages included) and
    /// preload the reply's command for review.
    fn compose(&mut self, line: &str) -> Result<()> {
        let turn = Turn::new(line, &self.last_run, self.options.send_output);
        self.agent.listen(&turn).context("deliver turn to agent")?;
        debug!(message = %turn.message, "turn sent to the model");

        let response = self
            .agent
            .respond(&mut io::stdout())
            .context("read agent response")?;

        match proposed_command(&response) {
            Some(command) => {
                self.reader
                    .preload(&command)
                    .context("preload proposed command")?;
                self.enter_reviewing();
            }
            None => debug!("reply contained no command line, staying in composing mode"),
        }
        Ok(())
    }

    fn enter_composing(&mut self) {
        self.mode = Mode::Composing;
        self.reader.set_prompt(&self.options.composing_prompt);
    }

    fn enter_reviewing(&mut self) {
        self.mode = Mode::Reviewing;
        self.reader.set_prompt(&self.options.reviewing_prompt);
    }
}
