//! Prompt templates rendered for the chat client.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::agent::Turn;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");
const USER_TEMPLATE: &str = include_str!("prompts/user.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template should be valid");
        env.add_template("user", USER_TEMPLATE)
            .expect("user template should be valid");
        Self { env }
    }

    /// Render the session system prompt.
    pub fn render_system(&self, shell: &str, os: &str) -> Result<String> {
        let template = self.env.get_template("system")?;
        let rendered = template
            .render(context! { shell => shell, os => os })
            .context("render system prompt")?;
        Ok(rendered)
    }

    /// Render one user turn. Captured output is included only when the
    /// session forwards it.
    pub fn render_user(&self, turn: &Turn) -> Result<String> {
        let template = self.env.get_template("user")?;
        let rendered = template
            .render(context! {
                message => turn.message,
                command_was_run => turn.command_was_run,
                actual_command => turn.actual_command,
                stdout => turn.stdout,
                stderr => turn.stderr,
                exit_code => turn.exit_code,
                send_output => turn.send_output,
            })
            .context("render user prompt")?;
        Ok(rendered)
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecutionRecord;

    #[test]
    fn system_prompt_names_shell_and_os() {
        let engine = PromptEngine::new();
        let rendered = engine.render_system("/bin/bash", "linux").expect("render");

        assert!(rendered.contains("/bin/bash"));
        assert!(rendered.contains("linux"));
    }

    #[test]
    fn first_turn_renders_only_the_message() {
        let engine = PromptEngine::new();
        let turn = Turn::new("list files", &ExecutionRecord::default(), true);
        let rendered = engine.render_user(&turn).expect("render");

        assert!(rendered.contains("list files"));
        assert!(!rendered.contains("exited with code"));
        assert!(!rendered.contains("stdout"));
    }

    #[test]
    fn output_is_forwarded_only_when_enabled() {
        let engine = PromptEngine::new();
        let record = ExecutionRecord {
            command: "/bin/sh -c ls".to_string(),
            ran: true,
            stdout_tail: "main.rs".to_string(),
            stderr_tail: String::new(),
            exit_code: 0,
        };

        let with = engine
            .render_user(&Turn::new("next", &record, true))
            .expect("render");
        assert!(with.contains("/bin/sh -c ls"));
        assert!(with.contains("exited with code 0"));
        assert!(with.contains("main.rs"));

        let without = engine
            .render_user(&Turn::new("next", &record, false))
            .expect("render");
        assert!(without.contains("exited with code 0"));
        assert!(!without.contains("main.rs"));
    }
}
