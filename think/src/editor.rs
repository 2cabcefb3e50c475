//! Line-editing seam between the REPL and rustyline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing::debug;

use crate::complete::ReplHelper;

/// One read from the line editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    Line(String),
    /// ^C while editing the current line.
    Interrupted,
    /// End of input (^D on an empty line).
    Eof,
}

/// Line-editing collaborator. The REPL owns one for its lifetime; tests use
/// scripted implementations.
pub trait LineReader {
    fn read_line(&mut self) -> Result<ReadEvent>;
    fn set_prompt(&mut self, prompt: &str);
    /// Stage text to appear in the edit buffer on the next read, as if the
    /// user had typed it.
    fn preload(&mut self, text: &str) -> Result<()>;
}

/// rustyline-backed reader with persistent history and path completion.
pub struct RustylineReader {
    editor: Editor<ReplHelper, DefaultHistory>,
    prompt: String,
    pending: Option<String>,
    history_path: PathBuf,
}

impl RustylineReader {
    /// History file kept in the user's home directory.
    pub const HISTORY_FILE: &'static str = ".think_history";

    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("determine home directory")?;
        let history_path = home.join(Self::HISTORY_FILE);

        let mut editor: Editor<ReplHelper, DefaultHistory> =
            Editor::new().context("initialize line editor")?;
        editor.set_helper(Some(ReplHelper));
        if editor.load_history(&history_path).is_err() {
            debug!(path = %history_path.display(), "no existing history");
        }

        Ok(Self {
            editor,
            prompt: "> ".to_string(),
            pending: None,
            history_path,
        })
    }
}

impl LineReader for RustylineReader {
    fn read_line(&mut self) -> Result<ReadEvent> {
        let attempt = match self.pending.take() {
            Some(text) => self
                .editor
                .readline_with_initial(&self.prompt, (&text, "")),
            None => self.editor.readline(&self.prompt),
        };
        match attempt {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ReadEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(err) => Err(err).context("read line"),
        }
    }

    fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    fn preload(&mut self, text: &str) -> Result<()> {
        self.pending = Some(text.to_string());
        Ok(())
    }
}

impl Drop for RustylineReader {
    fn drop(&mut self) {
        if let Err(err) = self.editor.save_history(&self.history_path) {
            debug!(%err, "failed to save history");
        }
    }
}
