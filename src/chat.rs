//! Old-timer answers: context rendering, prompt building and the chat client.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::pinecone::QueryMatch;

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

const SYSTEM_PROMPT: &str = "You are a friendly baseball historian who speaks in a folksy manner.";

/// Sampling parameters for one answer.
pub struct ChatRequest<'a> {
    /// User prompt, usually from [`build_prompt`].
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: usize,
}

/// Joins the `text` metadata of `matches`, one per line.
pub fn render_context(matches: &[QueryMatch]) -> Result<String> {
    if matches.is_empty() {
        bail!("index returned no matches; no relevant context to answer from");
    }
    Ok(matches
        .iter()
        .map(|m| m.text().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Builds the old-timer user prompt around `context`.
pub fn build_prompt(question: &str, context: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are an \"Old Timer\" baseball historian.\n");
    prompt.push_str("Context from baseball knowledge base:\n");
    prompt.push_str(context);
    prompt.push_str("\n---\n");
    prompt.push_str("Answer the user in a friendly, folksy tone. If the context doesn't contain relevant information,\n");
    prompt.push_str("you can draw from your general baseball knowledge, but prioritize the context if available.\n");
    prompt.push_str(&format!("User message: \"{}\"", question.trim()));
    prompt
}

/// Blocking chat-completions client.
pub struct OpenAiChat {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl OpenAiChat {
    /// Builds a chat client against `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(api_key: String, base_url: &str, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
        })
    }

    /// Requests one completion and returns its text.
    pub fn answer(&self, request: &ChatRequest) -> Result<String> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = CompletionRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .context("failed to call OpenAI chat completions")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("OpenAI returned {}: {}", status, text);
        }
        let parsed: CompletionResponse = resp.json().context("failed to parse OpenAI response")?;
        parsed.into_answer()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<ChatChoice>,
}

impl CompletionResponse {
    fn into_answer(self) -> Result<String> {
        let answer = self
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default();
        if answer.trim().is_empty() {
            bail!("OpenAI response missing answer text");
        }
        Ok(answer)
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}
