use std::time::Duration;

use reqwest::Client;

use super::error::LlmError;
use super::types::{ChatRequest, ChatResponse};

pub const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Anything that can answer a chat-completions request. Tests swap in mocks.
pub trait ChatSender {
    async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse, LlmError>;
}

pub struct ChatClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl ChatClient {
    /// Create a client pointing at a custom endpoint (proxies, local servers, tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url,
        })
    }
}

impl ChatSender for ChatClient {
    async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(LlmError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<ChatResponse>().await?;
        Ok(body)
    }
}
