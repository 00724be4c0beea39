//! LLM agent module for abstract summarization.
//!
//! Talks to an OpenAI-compatible chat-completion endpoint (OpenRouter by
//! default). When no key is configured, or the request fails in any way, the
//! first few sentences of the input are used instead.

use crate::config::{Config, LlmConfig};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

lazy_static! {
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]\s+").expect("valid sentence pattern");
}

/// Sentences kept by the extractive fallback
pub const FALLBACK_SENTENCES: usize = 3;

const PROMPT: &str =
    "Summarize this research abstract for a weekly digest (3–4 sentences, technical tone):";

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("no API key configured")]
    MissingCredential,
    #[error("HTTP client unavailable")]
    ClientUnavailable,
    #[error("LLM request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Malformed(String),
}

/// Result of summarizing one abstract.
#[derive(Debug)]
pub enum SummaryOutcome {
    /// Text returned by the completion API
    Generated(String),
    /// Extractive fallback, with the reason the API was not used
    Fallback {
        text: String,
        reason: SummarizeError,
    },
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SummaryOutcome::Fallback { .. })
    }
}

/// Anything that can turn an abstract into digest text
#[allow(async_fn_in_trait)]
pub trait Summarize {
    async fn summarize(&self, text: &str) -> SummaryOutcome;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat-completion summarizer.
///
/// Construction never fails: without an HTTP client every call falls back.
pub struct Summarizer {
    http: Option<Client>,
    config: LlmConfig,
    api_key: Option<String>,
}

impl Summarizer {
    pub fn new(config: &LlmConfig, api_key: Option<&str>) -> Self {
        let http = match Client::builder().timeout(config.timeout()).build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "could not build LLM client, summaries will use the fallback");
                None
            }
        };

        Self {
            http,
            config: config.clone(),
            api_key: api_key.map(str::to_string),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.llm, config.api_key())
    }

    /// Ask the completion API for a summary, reporting why it could not
    pub async fn try_summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizeError::MissingCredential)?;
        let http = self.http.as_ref().ok_or(SummarizeError::ClientUnavailable)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{}\n\n{}", PROMPT, text),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, url = %self.config.url, "requesting summary");
        let response = http
            .post(&self.config.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let raw = response.text().await?;
        let data: Value = serde_json::from_str(&raw)
            .map_err(|e| SummarizeError::Malformed(format!("{}: {}", e, raw)))?;

        extract_content(&data)
    }
}

impl Summarize for Summarizer {
    async fn summarize(&self, text: &str) -> SummaryOutcome {
        match self.try_summarize(text).await {
            Ok(summary) => SummaryOutcome::Generated(summary),
            Err(reason) => {
                if !matches!(reason, SummarizeError::MissingCredential) {
                    warn!(error = %reason, "summarization failed, using extractive fallback");
                }
                SummaryOutcome::Fallback {
                    text: fallback_summary(text),
                    reason,
                }
            }
        }
    }
}

/// Pull the summary text out of a chat-completion response.
///
/// Accepts `choices[0].message.content` or `choices[0].text`; anything else
/// in `choices[0]` is returned as its JSON string.
pub fn extract_content(data: &Value) -> Result<String, SummarizeError> {
    let choice = data
        .get("choices")
        .and_then(|choices| choices.get(0))
        .ok_or_else(|| SummarizeError::Malformed(format!("no choices in response: {}", data)))?;

    let non_empty = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let content = non_empty(choice.get("message").and_then(|m| m.get("content")))
        .or_else(|| non_empty(choice.get("text")))
        .unwrap_or_else(|| match choice.as_str() {
            Some(s) => s.trim().to_string(),
            None => choice.to_string(),
        });

    Ok(content)
}

/// Split on whitespace that follows `.`, `!` or `?`
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BREAK.find_iter(text) {
        // The punctuation mark is one byte and stays with its sentence
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);
    sentences
}

/// First three sentences of `text`, joined by single spaces
pub fn fallback_summary(text: &str) -> String {
    split_sentences(text)
        .into_iter()
        .take(FALLBACK_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
