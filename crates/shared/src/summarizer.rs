use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

const ARTICLE_MAX_TOKENS: u32 = 150;
const DAILY_MAX_TOKENS: u32 = 200;

/// Article text is truncated to this many bytes before being sent.
const MAX_ARTICLE_CHARS: usize = 10_000;

const ARTICLE_PROMPT: &str = "You are a news summarizer. Create concise, factual summaries \
    in 2-3 sentences. Focus on key information and maintain \
    journalistic neutrality.";

const DAILY_PROMPT: &str = "You are a news editor creating daily briefings. Synthesize \
    multiple stories into a concise overview that captures the \
    most significant developments of the day. Be factual and \
    objective.";

/// A provider of per-article and per-day summaries.
///
/// Both operations absorb their own failures: a failed call is logged by
/// the implementation and surfaces as `None`, never as an error.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize_article(&self, text: &str) -> Option<String>;

    /// Synthesize a daily overview from the article summaries.
    /// `None` on failure or when `summaries` is empty.
    async fn summarize_day(&self, summaries: &[String]) -> Option<String>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Summarizes via the OpenAI chat completions API.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: String, temperature: f32) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
            temperature,
        })
    }

    async fn generate_completion(
        &self,
        prompt: &str,
        content: &str,
        max_tokens: u32,
    ) -> Option<String> {
        for attempt in 0..3 {
            match self.try_completion(prompt, content, max_tokens).await {
                Ok(text) => return Some(text),
                Err(e) => {
                    if attempt == 2 {
                        warn!(error = %e, "summarization failed after retries");
                        return None;
                    }
                    let backoff = std::time::Duration::from_millis(1000 * (2_u64.pow(attempt)));
                    debug!(error = %e, attempt, "summarization attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        None
    }

    async fn try_completion(
        &self,
        prompt: &str,
        content: &str,
        max_tokens: u32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: content.to_string(),
                },
            ],
            max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            // Error bodies are JSON with a nested message; fall back to the
            // raw body when they aren't.
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| body.error.message)
                .unwrap_or(error_text);
            anyhow::bail!("OpenAI API error ({status}): {message}");
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse OpenAI API response")?;

        let text = chat_response
            .choices
            .first()
            .map(|c| c.message.content.trim())
            .unwrap_or("");

        if text.is_empty() {
            anyhow::bail!("OpenAI API returned an empty completion");
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize_article(&self, text: &str) -> Option<String> {
        let truncated = truncate_on_char_boundary(text, MAX_ARTICLE_CHARS);
        self.generate_completion(
            ARTICLE_PROMPT,
            &format!("Summarize this news article:\n\n{truncated}"),
            ARTICLE_MAX_TOKENS,
        )
        .await
    }

    async fn summarize_day(&self, summaries: &[String]) -> Option<String> {
        if summaries.is_empty() {
            return None;
        }

        let combined = summaries
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n\n");

        self.generate_completion(
            DAILY_PROMPT,
            &format!(
                "Create a brief overview of today's top stories based on these summaries:\n\n{combined}"
            ),
            DAILY_MAX_TOKENS,
        )
        .await
    }
}

/// Truncate to at most `max_len` bytes, respecting UTF-8 boundaries.
fn truncate_on_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
