//! OpenAI-compatible chat backend for the [`Agent`] seam.
//!
//! Blocking HTTP client that keeps the full conversation in memory and
//! streams each reply (SSE chat completions) to a display sink as it
//! arrives. Request submission retries with capped exponential backoff;
//! a broken stream is not retried.

use std::io::{BufRead, BufReader, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::agent::{Agent, Turn};
use crate::prompt::PromptEngine;

const RETRY_INITIAL: Duration = Duration::from_secs(1);
const RETRY_CAP: Duration = Duration::from_secs(5);
const RETRY_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// One `data:` payload of the SSE response.
#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client implementing [`Agent`].
pub struct ChatAgent {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    prompts: PromptEngine,
    history: Vec<ChatMessage>,
}

impl ChatAgent {
    /// Create a client whose system prompt is parameterized by the user's
    /// shell and operating system.
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        max_tokens: u32,
        shell: &str,
        os: &str,
    ) -> Result<Self> {
        let prompts = PromptEngine::new();
        let system = prompts.render_system(shell, os)?;
        Ok(Self {
            http: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            prompts,
            history: vec![ChatMessage {
                role: "system",
                content: system,
            }],
        })
    }

    /// Submit the request, retrying transient failures. 4xx responses are
    /// permanent and reported immediately.
    fn send(&self, body: &serde_json::Value) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/chat/completions", self.api_base);
        let mut delay = RETRY_INITIAL;
        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 1..=RETRY_ATTEMPTS {
            let sent = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send();
            match sent {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().unwrap_or_default();
                    if status.is_client_error() {
                        bail!("chat request rejected: {status}: {text}");
                    }
                    warn!(%status, attempt, "chat request failed, retrying");
                    last_err = Some(anyhow!("{status}: {text}"));
                }
                Err(err) => {
                    warn!(%err, attempt, "chat request error, retrying");
                    last_err = Some(err.into());
                }
            }
            thread::sleep(delay);
            delay = (delay * 2).min(RETRY_CAP);
        }

        match last_err {
            Some(err) => Err(err.context("chat request retries exhausted")),
            None => Err(anyhow!("chat request retries exhausted")),
        }
    }
}

impl Agent for ChatAgent {
    fn listen(&mut self, turn: &Turn) -> Result<()> {
        let content = self.prompts.render_user(turn)?;
        debug!(
            message = %turn.message,
            command_was_run = turn.command_was_run,
            "turn recorded for the model"
        );
        self.history.push(ChatMessage {
            role: "user",
            content,
        });
        Ok(())
    }

    fn respond(&mut self, sink: &mut dyn Write) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": self.history,
            "max_tokens": self.max_tokens,
            "stream": true,
        });

        let response = self.send(&body)?;
        let full = consume_stream(BufReader::new(response), sink)?;

        self.history.push(ChatMessage {
            role: "assistant",
            content: full.clone(),
        });
        Ok(full)
    }
}

/// Drain an SSE chat-completions stream, writing each content delta to
/// `sink` as it arrives and returning the accumulated reply.
fn consume_stream<R: BufRead>(reader: R, sink: &mut dyn Write) -> Result<String> {
    let mut full = String::new();
    for line in reader.lines() {
        let line = line.context("read response stream")?;
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            break;
        }
        let payload: ChunkPayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "skipping malformed stream chunk");
                continue;
            }
        };
        if let Some(text) = payload
            .choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
        {
            sink.write_all(text.as_bytes()).context("write reply chunk")?;
            sink.flush().context("flush reply chunk")?;
            full.push_str(text);
        }
    }
    if !full.is_empty() && !full.ends_with('\n') {
        // Keep the next prompt off the reply's final line.
        sink.write_all(b"\n").context("write reply newline")?;
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    #[test]
    fn stream_deltas_are_echoed_and_accumulated() {
        let mut raw = String::new();
        raw.push_str(&chunk("List"));
        raw.push_str(&chunk(" files.\n\n"));
        raw.push_str(&chunk("ls -la"));
        raw.push_str("data: [DONE]\n\n");

        let mut sink = Vec::new();
        let full = consume_stream(raw.as_bytes(), &mut sink).expect("consume");

        assert_eq!(full, "List files.\n\nls -la");
        assert_eq!(String::from_utf8(sink).expect("utf8"), "List files.\n\nls -la\n");
    }

    #[test]
    fn empty_deltas_and_malformed_chunks_are_skipped() {
        let raw = format!(
            "data: {}\ndata: not json\n{}data: [DONE]\n",
            json!({"choices": [{"delta": {}}]}),
            chunk("pwd")
        );

        let mut sink = Vec::new();
        let full = consume_stream(raw.as_bytes(), &mut sink).expect("consume");

        assert_eq!(full, "pwd");
    }

    #[test]
    fn stream_without_done_marker_still_completes() {
        let raw = chunk("echo hi\n");
        let mut sink = Vec::new();
        let full = consume_stream(raw.as_bytes(), &mut sink).expect("consume");

        assert_eq!(full, "echo hi\n");
        assert_eq!(sink, b"echo hi\n");
    }

    #[test]
    fn empty_stream_yields_empty_reply() {
        let mut sink = Vec::new();
        let full = consume_stream("".as_bytes(), &mut sink).expect("consume");

        assert!(full.is_empty());
        assert!(sink.is_empty());
    }
}
