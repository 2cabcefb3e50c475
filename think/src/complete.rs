//! Filesystem path completion for the line editor.
//!
//! Completion targets the last whitespace- or pipe-delimited token before
//! the cursor. Candidates are full replacement tokens (the directory part as
//! typed plus a matching entry name), so the editor substitutes the whole
//! token rather than appending a suffix.

use std::borrow::Cow;
use std::fs;
use std::path::{Component, Path, PathBuf};

use colored::Colorize;
use rustyline::Helper;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use tracing::debug;

/// Result of one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCompletion {
    /// Full replacement tokens, in directory listing order.
    pub candidates: Vec<String>,
    /// Byte length of the name prefix after the last `/` of the target.
    pub prefix_len: usize,
    /// Byte offset in the line where the completed token begins.
    pub token_start: usize,
}

impl PathCompletion {
    fn empty(token_start: usize) -> Self {
        Self {
            candidates: Vec::new(),
            prefix_len: 0,
            token_start,
        }
    }
}

/// Propose path completions for the token under the cursor.
///
/// The token is split at its final `/` into a directory part and a name
/// prefix; without a separator the current directory is listed. A listing
/// failure (missing or unreadable directory) yields an empty result, never
/// an error. Candidates keep the directory part exactly as typed, with a
/// leading `./` stripped.
pub fn complete_path(line: &str, pos: usize) -> PathCompletion {
    let before = &line[..pos];
    let token_start = before
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace() || *c == '|')
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    let target = &before[token_start..];

    let (dir_part, name_prefix) = match target.rfind('/') {
        Some(idx) => target.split_at(idx + 1),
        None => ("", target),
    };

    // `.`/`..` are resolved only for the listing; candidates are rebuilt
    // from the directory text exactly as the user typed it.
    let list_dir: Cow<'_, Path> = if dir_part.is_empty() {
        Cow::Borrowed(Path::new("."))
    } else {
        Cow::Owned(normalize(dir_part))
    };

    let entries = match fs::read_dir(list_dir.as_ref()) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %list_dir.display(), %err, "directory listing failed");
            return PathCompletion::empty(token_start);
        }
    };

    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        // Non-UTF-8 names cannot round-trip through the line buffer.
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(name_prefix) {
            continue;
        }
        let joined = format!("{dir_part}{name}");
        let candidate = joined.strip_prefix("./").unwrap_or(&joined);
        candidates.push(candidate.to_string());
    }

    PathCompletion {
        candidates,
        prefix_len: name_prefix.len(),
        token_start,
    }
}

/// Lexically resolve `.` and `..` segments, like `filepath.Clean`.
fn normalize(dir: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in Path::new(dir).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.as_os_str().is_empty() || out.ends_with("..") {
                    out.push("..");
                } else {
                    // No-op at the filesystem root.
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// rustyline helper: path completion plus mode-colored prompts.
pub struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let completion = complete_path(line, pos);
        let pairs = completion
            .candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((completion.token_start, pairs))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ReplHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        match prompt.strip_suffix("> ") {
            Some("think") => Cow::Owned(format!("{}> ", "think".cyan())),
            Some("run") => Cow::Owned(format!("{}> ", "run".red())),
            _ => Cow::Borrowed(prompt),
        }
    }
}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}
