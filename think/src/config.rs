//! User configuration stored under `~/.config/think/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configured model.
pub const MODEL_ENV: &str = "THINK_MODEL";
/// Environment variable supplying the shell interpreter path.
pub const SHELL_ENV: &str = "SHELL";
/// Shell used when `$SHELL` is unset.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// On-disk configuration (TOML).
///
/// This file is intended to be edited by humans; missing fields default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Model requested from the chat endpoint.
    pub model: String,
    /// Chat completions API base URL.
    pub api_base: String,
    /// Completion token budget per reply.
    pub max_tokens: u32,
    /// Forward captured command output to the model by default.
    pub send_output: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            max_tokens: 500,
            send_output: false,
        }
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must not be empty"));
        }
        if self.api_base.trim().is_empty() {
            return Err(anyhow!("api_base must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `FileConfig::default()`.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        let cfg = FileConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FileConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Default config path, `~/.config/think/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("think").join("config.toml"))
}

/// Fully-resolved session settings.
///
/// Built once at startup and passed into the collaborators; nothing is
/// re-resolved per command. Precedence: CLI flag > environment > config
/// file > built-in default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub send_output: bool,
    pub shell_path: String,
}

impl Settings {
    pub fn resolve(
        file: FileConfig,
        model_flag: Option<String>,
        send_output_flag: bool,
        model_env: Option<String>,
        shell_env: Option<String>,
    ) -> Self {
        let model = model_flag
            .filter(|m| !m.trim().is_empty())
            .or_else(|| model_env.filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| file.model.clone());
        let shell_path = shell_env
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());

        Self {
            model,
            api_base: file.api_base,
            max_tokens: file.max_tokens,
            send_output: send_output_flag || file.send_output,
            shell_path,
        }
    }
}
