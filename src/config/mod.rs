//! Configuration module for Frage.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QuestionPrompts};
pub use settings::{
    ChunkingSettings, GeneralSettings, GeneratorSettings, PromptSettings, QuestionSettings,
    ServerSettings, Settings, StoreSettings,
};
