use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Config error: {0}")]
    Config(String),

    /// Raised by signal sources; the oracle always recovers from it locally.
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Content generation failed for {ticket_id} at '{stage}': {reason}")]
    ContentGeneration {
        ticket_id: String,
        stage: String,
        reason: String,
    },

    #[error("Ticket {ticket_id} timed out after {secs}s")]
    Timeout { ticket_id: String, secs: u64 },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GeneratorError {
    pub fn content(ticket_id: &str, stage: &str, err: impl std::fmt::Display) -> Self {
        GeneratorError::ContentGeneration {
            ticket_id: ticket_id.to_string(),
            stage: stage.to_string(),
            reason: err.to_string(),
        }
    }
}
