//! Text collaborators of the lifecycle engine.
//!
//! [`CommentGenerator`] and [`DescriptionGenerator`] are the two seams the
//! engine writes narrative through. [`TemplateWriter`] fills fixed templates
//! and never fails; [`LlmWriter`] asks a chat-completions backend.

pub mod llm;
pub mod template;

pub use llm::LlmWriter;
pub use template::TemplateWriter;

use crate::workflow::WorkflowStep;

/// Everything a comment may be conditioned on. `prior_comments` only ever
/// holds comments already emitted for this ticket, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct CommentRequest<'a> {
    pub ticket_id: &'a str,
    pub step: &'a WorkflowStep,
    pub category_name: &'a str,
    pub description: &'a str,
    pub prior_comments: &'a [String],
    /// Set for per-action steps.
    pub action: Option<&'a str>,
}

pub trait CommentGenerator {
    async fn comment(&self, req: &CommentRequest<'_>) -> anyhow::Result<String>;
}

pub trait DescriptionGenerator {
    async fn describe(&self, category_name: &str, hint: &str) -> anyhow::Result<String>;
}
