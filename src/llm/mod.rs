pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{ChatClient, ChatSender};
pub use error::LlmError;
pub use retry::RetryPolicy;
pub use types::ChatRequest;
