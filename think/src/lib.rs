//! AI-assisted shell command REPL.
//!
//! `think` alternates between two modes: *composing*, where the user
//! describes a task and the model replies with a short explanation whose
//! final line is a shell command, and *reviewing*, where that command sits
//! in the edit buffer for the user to tweak and run. Output captured from
//! the run feeds the next composing turn.
//!
//! - [`repl`]: the two-state loop.
//! - [`exec`]: shell invocation with live, bounded output capture.
//! - [`complete`]: filesystem path completion for the line editor.
//! - [`agent`] / [`client`]: model collaborator seam and its HTTP backend.
//! - [`editor`]: line-editing seam over rustyline.

pub mod agent;
pub mod client;
pub mod complete;
pub mod config;
pub mod editor;
pub mod exec;
pub mod logging;
pub mod prompt;
pub mod repl;
