//! Chat-completions backed text and oracle signals.

use std::cell::RefCell;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{CommentGenerator, CommentRequest, DescriptionGenerator};
use crate::error::GeneratorError;
use crate::llm::{ChatRequest, ChatSender, LlmError, RetryPolicy};
use crate::oracle::SignalSource;

const RULE: &str = "--------------------";

/// Writes descriptions and comments with an LLM and answers oracle signals.
pub struct LlmWriter<C> {
    client: C,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
    /// Draws prompt word limits; seeded together with the batch.
    word_rng: RefCell<StdRng>,
}

impl<C: ChatSender> LlmWriter<C> {
    pub fn new(client: C, model: impl Into<String>, temperature: f32, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            retry,
            word_rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    /// Fixes the word-limit draws so a seeded run sends the same prompts.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            word_rng: RefCell::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn word_limit(&self, range: RangeInclusive<u32>) -> u32 {
        self.word_rng.borrow_mut().gen_range(range)
    }

    async fn complete(&self, req: ChatRequest) -> Result<String, LlmError> {
        let resp = self.retry.send(&self.client, &req).await?;
        resp.text().ok_or(LlmError::EmptyCompletion)
    }

    /// Single-token, zero-temperature request used for numeric answers.
    async fn signal(&self, prompt: String) -> Result<String, GeneratorError> {
        let req = ChatRequest::user(&self.model, prompt)
            .temperature(0.0)
            .max_tokens(1);
        Ok(self.complete(req).await?)
    }
}

pub(crate) fn comment_prompt(req: &CommentRequest<'_>, word_limit: u32) -> String {
    let mut previous = req.prior_comments.join("\n");
    if let Some(action) = req.action {
        if !previous.is_empty() {
            previous.push('\n');
        }
        previous.push_str(&format!("Action: {action}"));
    }
    format!(
        "Role: {role}\n\
         Ticket ID: {ticket}\n\
         Category: {category}\n\
         Status: {status}\n\
         Ticket Description: {description}\n\
         Previous Comments:\n\
         {RULE}\n\
         {previous}\n\
         {RULE}\n\
         Write your comment in the professional, technical register of your role. \
         Stay consistent with the context above. \
         Keep it to roughly {word_limit} words.",
        role = req.step.instruction,
        ticket = req.ticket_id,
        category = req.category_name,
        status = req.step.status,
        description = req.description,
    )
}

pub(crate) fn description_prompt(category_name: &str, hint: &str, word_limit: u32) -> String {
    format!(
        "You are a technician on the A220 aircraft assembly line working in the \
         {category_name} domain.\n\
         Starting from the hint '{hint}', write a realistic non-conformity report: \
         what was observed, measurements, locations, in the technical language of a \
         technician.\n\
         Keep it to roughly {word_limit} words."
    )
}

pub(crate) fn complexity_prompt(description: &str, first_analysis: &str) -> String {
    format!(
        "Rate the complexity of the following non-conformity from 1 (low) to 3 (high). \
         Answer with the digit only.\n\n\
         Description: {description}\n\
         Technical Analysis: {first_analysis}"
    )
}

pub(crate) fn action_count_prompt(history: &[String]) -> String {
    format!(
        "From the ticket history below, estimate how many actions the corrective \
         action plan needs. Answer with a single integer between 1 and 5.\n\n\
         Ticket History:\n\
         {RULE}\n\
         {history}\n\
         {RULE}\n",
        history = history.join("\n"),
    )
}

impl<C: ChatSender> CommentGenerator for LlmWriter<C> {
    async fn comment(&self, req: &CommentRequest<'_>) -> anyhow::Result<String> {
        let word_limit = self.word_limit(50..=500);
        let prompt = comment_prompt(req, word_limit);
        let chat = ChatRequest::user(&self.model, prompt).temperature(self.temperature);
        Ok(self.complete(chat).await?)
    }
}

impl<C: ChatSender> DescriptionGenerator for LlmWriter<C> {
    async fn describe(&self, category_name: &str, hint: &str) -> anyhow::Result<String> {
        let word_limit = self.word_limit(50..=150);
        let prompt = description_prompt(category_name, hint, word_limit);
        let chat = ChatRequest::user(&self.model, prompt).temperature(self.temperature);
        Ok(self.complete(chat).await?)
    }
}

impl<C: ChatSender> SignalSource for LlmWriter<C> {
    async fn complexity_signal(
        &self,
        description: &str,
        first_analysis: &str,
    ) -> Result<String, GeneratorError> {
        self.signal(complexity_prompt(description, first_analysis))
            .await
    }

    async fn action_count_signal(&self, history: &[String]) -> Result<String, GeneratorError> {
        self.signal(action_count_prompt(history)).await
    }
}
