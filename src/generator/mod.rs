//! Question generation backends.

mod openai;
pub mod parse;

pub use openai::OpenAiGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// One request to the text-generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System-level instruction framing the task.
    pub system_instruction: String,
    /// User prompt carrying the excerpt and requirements.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token budget.
    pub max_output_tokens: u32,
}

/// Trait for text-generation backends that produce questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Run one completion and return the raw model output.
    ///
    /// The output is expected to contain a JSON array of questions, possibly
    /// wrapped in prose; callers parse it with [`parse::parse_questions`].
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;

    /// Identifier recorded on persisted questions (e.g. provider and model).
    fn tag(&self) -> String;
}
