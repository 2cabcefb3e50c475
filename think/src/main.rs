//! `think`: describe a task, review the generated shell command, run it.
//!
//! The model is configured with `--model`, the `THINK_MODEL` environment
//! variable, or `~/.config/think/config.toml`, in that order. The shell
//! comes from `$SHELL` (default `/bin/bash`) and is resolved once at
//! startup. `OPENAI_API_KEY` must be set.

use anyhow::{Context, Result};
use clap::Parser;

use think::client::ChatAgent;
use think::config::{self, FileConfig, Settings};
use think::editor::RustylineReader;
use think::logging;
use think::repl::{Repl, ReplOptions};

#[derive(Parser)]
#[command(
    name = "think",
    version,
    about = "AI-assisted shell: describe a task, review the command, run it"
)]
struct Cli {
    /// Model to use (overrides THINK_MODEL and the config file).
    #[arg(short, long)]
    model: Option<String>,

    /// Forward captured command output to the model.
    #[arg(long)]
    send_output: bool,

    /// Initial task description, preloaded into the first prompt.
    #[arg(trailing_var_arg = true)]
    input: Vec<String>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let file = match config::default_config_path() {
        Some(path) => config::load_config(&path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        file,
        cli.model,
        cli.send_output,
        std::env::var(config::MODEL_ENV).ok(),
        std::env::var(config::SHELL_ENV).ok(),
    );

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;

    let agent = ChatAgent::new(
        &settings.api_base,
        &api_key,
        &settings.model,
        settings.max_tokens,
        &settings.shell_path,
        std::env::consts::OS,
    )?;
    let reader = RustylineReader::new()?;

    let options = ReplOptions {
        shell_path: settings.shell_path.clone(),
        send_output: settings.send_output,
        initial_input: cli.input.join(" "),
        composing_prompt: "think> ".to_string(),
        reviewing_prompt: "run> ".to_string(),
    };

    Repl::new(reader, agent, options).run()
}
