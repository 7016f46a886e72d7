use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use super::client::ChatSender;
use super::error::LlmError;
use super::types::{ChatRequest, ChatResponse};

/// Retry behaviour for transient backend failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms * 2u64.pow(attempt.saturating_sub(1))
    }

    /// Send `req`, retrying transient errors with backoff. A rate limit waits
    /// at least as long as the server asked.
    pub async fn send(
        &self,
        sender: &impl ChatSender,
        req: &ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        let mut attempt = 0;
        loop {
            match sender.send_chat(req).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let mut delay_ms = self.delay_for_attempt(attempt);
                    if let LlmError::RateLimited { retry_after_ms } = &e {
                        delay_ms = delay_ms.max(*retry_after_ms);
                    }
                    warn!(
                        attempt,
                        max = self.max_retries,
                        delay_ms,
                        error = %e,
                        "retrying text generation call"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
