//! OpenAI chat-completion question generator.

use super::{GenerationRequest, QuestionGenerator};
use crate::error::{FrageError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Generator backed by the OpenAI chat completions API.
pub struct OpenAiGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiGenerator {
    /// Create a generator for the given chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_instruction.clone())
                .build()
                .map_err(|e| FrageError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(|e| FrageError::Generation(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_output_tokens)
            .build()
            .map_err(|e| FrageError::Generation(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            FrageError::OpenAI(format!("Question generation request failed: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| FrageError::Generation("Empty response from model".to_string()))?
            .clone();

        debug!("Generator returned {} characters", content.len());
        Ok(content)
    }

    fn tag(&self) -> String {
        format!("openai:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_tag_names_the_model() {
        let generator = OpenAiGenerator::new("gpt-4o-mini");
        assert_eq!(generator.tag(), "openai:gpt-4o-mini");
    }
}
