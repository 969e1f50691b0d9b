use crate::adapters::http::{build_client, join_url};
use crate::adapters::prompts::{user_prompt, AMAZON_SUMMARY_SYSTEM_PROMPT};
use crate::core::memo::MEMO_LIMIT;
use crate::domain::model::SummaryRequest;
use crate::domain::ports::MemoSummarizer;
use crate::utils::error::{Result, YnaError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiSummarizer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(YnaError::MissingOpenAiKey);
        }
        Ok(Self {
            client: build_client()?,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl MemoSummarizer for OpenAiSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<Option<String>> {
        let prompt = user_prompt(&request.items, request.markdown);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: AMAZON_SUMMARY_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let response = match self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Unexpected error using OpenAI API: {}", e);
                return Ok(None);
            }
        };

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(YnaError::InvalidOpenAiKey),
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::error!("OpenAI API rate limit exceeded");
                return Ok(None);
            }
            status if !status.is_success() => {
                let detail = response.text().await.unwrap_or_default();
                tracing::error!("OpenAI API error {}: {}", status, detail);
                return Ok(None);
            }
            _ => {}
        }

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Could not decode OpenAI response: {}", e);
                return Ok(None);
            }
        };

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(YnaError::EmptyAiResponse)?;

        if content.chars().count() > MEMO_LIMIT {
            return Ok(Some(content.chars().take(MEMO_LIMIT).collect()));
        }
        Ok(Some(content))
    }
}
