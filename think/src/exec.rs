//! Shell command execution with live output and bounded capture.
//!
//! The child's stdout/stderr stream to the terminal in real time while a
//! rolling in-memory copy is kept for the next agent turn. Only the tail of
//! each stream survives; the user always sees everything.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

/// Maximum characters of each stream retained for the agent turn.
pub const OUTPUT_TAIL_CHARS: usize = 1000;

/// Exit code reported when the shell itself could not be spawned.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Rolling byte bound on the in-memory copy of each stream. Large enough to
/// always contain the final [`OUTPUT_TAIL_CHARS`] characters of UTF-8.
const TAIL_BUFFER_BYTES: usize = 16 * 1024;

/// Outcome of the most recent shell invocation.
///
/// `default()` is the before-first-run record: `ran` is false and every
/// other field is empty or zero. Only [`run_shell`] produces live records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Fully-qualified invocation text, `<shell> -c <command>`.
    pub command: String,
    /// Whether a command has been run this session.
    pub ran: bool,
    /// Final characters of captured stdout, at most [`OUTPUT_TAIL_CHARS`].
    pub stdout_tail: String,
    /// Final characters of captured stderr, at most [`OUTPUT_TAIL_CHARS`].
    pub stderr_tail: String,
    /// Shell exit code; `-1` when killed by a signal,
    /// [`SPAWN_FAILURE_CODE`] when the shell could not be started.
    pub exit_code: i32,
}

/// Run `shell -c line`, teeing both output streams to the terminal while
/// capturing their tails. Blocks until the child terminates; no timeout.
///
/// A command that exits non-zero is not an error. A shell that cannot be
/// spawned is reported through the record's sentinel exit code, with the OS
/// error surfaced on stderr. `Err` is reserved for internal failures
/// (pipe wiring, reader threads).
#[instrument(skip_all, fields(shell = %shell))]
pub fn run_shell(shell: &str, line: &str) -> Result<ExecutionRecord> {
    let command = format!("{shell} -c {line}");

    let spawned = Command::new(shell)
        .arg("-c")
        .arg(line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            warn!(%err, "failed to spawn shell");
            let message = format!("{shell}: {err}\n");
            let _ = io::stderr().write_all(message.as_bytes());
            return Ok(ExecutionRecord {
                command,
                ran: true,
                stdout_tail: String::new(),
                stderr_tail: tail_chars(&message, OUTPUT_TAIL_CHARS),
                exit_code: SPAWN_FAILURE_CODE,
            });
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    // Drain both pipes concurrently so neither can fill and stall the child.
    let stdout_handle = thread::spawn(move || tee_tail(stdout, io::stdout()));
    let stderr_handle = thread::spawn(move || tee_tail(stderr, io::stderr()));

    let status = child.wait().context("wait for shell")?;
    let stdout_bytes = join_tail(stdout_handle).context("join stdout")?;
    let stderr_bytes = join_tail(stderr_handle).context("join stderr")?;

    let exit_code = status.code().unwrap_or(-1);
    debug!(exit_code, "command finished");

    Ok(ExecutionRecord {
        command,
        ran: true,
        stdout_tail: tail_chars(&String::from_utf8_lossy(&stdout_bytes), OUTPUT_TAIL_CHARS),
        stderr_tail: tail_chars(&String::from_utf8_lossy(&stderr_bytes), OUTPUT_TAIL_CHARS),
        exit_code,
    })
}

/// Copy `reader` to `term` chunk by chunk, flushing each write for real-time
/// visibility, while keeping a bounded tail of the bytes seen.
fn tee_tail<R: Read, W: Write>(mut reader: R, mut term: W) -> Result<Vec<u8>> {
    let mut tail = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        term.write_all(&chunk[..n]).context("write to terminal")?;
        term.flush().context("flush terminal")?;
        tail.extend_from_slice(&chunk[..n]);
        if tail.len() > TAIL_BUFFER_BYTES {
            let excess = tail.len() - TAIL_BUFFER_BYTES;
            tail.drain(..excess);
        }
    }
    Ok(tail)
}

fn join_tail(handle: thread::JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

/// Keep the final `limit` characters of `text`.
fn tail_chars(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        text.to_string()
    } else {
        text.chars().skip(total - limit).collect()
    }
}
