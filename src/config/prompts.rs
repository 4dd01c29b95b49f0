//! Prompt templates for Frage.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub questions: QuestionPrompts,
    /// Custom variables from config, available in all prompts as {{variable_name}}.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for multiple-choice question generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QuestionPrompts {
    fn default() -> Self {
        Self {
            system: "You are an expert {{language}} language teacher creating multiple-choice questions. Always return valid JSON.".to_string(),

            user: r#"Based on this {{language}} transcript excerpt ({{position}}), generate {{count}} multiple-choice questions for language learners.

Transcript excerpt:
"{{excerpt}}"

Context: This is {{placement}} of the transcript.
{{existing_questions}}

Requirements:
1. Question types to include: {{question_types}}
2. Difficulty level: {{difficulty}}
3. Each question must have exactly 4 options labeled A, B, C, D
4. Questions should be in {{language}}
5. Questions must be about THIS specific excerpt, not general knowledge
6. Avoid questions similar to existing ones
7. Format as JSON array with this exact structure:
[{
    "question": "Question text in {{language}}",
    "options": [
        {"label": "A", "text": "Option A text"},
        {"label": "B", "text": "Option B text"},
        {"label": "C", "text": "Option C text"},
        {"label": "D", "text": "Option D text"}
    ],
    "correct_answer": "B",
    "type": "comprehension",
    "difficulty": "medium",
    "explanation": "Brief explanation why this answer is correct"
}]

Generate diverse, educational questions that help students learn {{language}}."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load question prompts if file exists
            let questions_path = custom_path.join("questions.toml");
            if questions_path.exists() {
                let content = std::fs::read_to_string(&questions_path)?;
                prompts.questions = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
