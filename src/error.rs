//! Error types for Frage.

use thiserror::Error;

/// Library-level error type for Frage operations.
#[derive(Error, Debug)]
pub enum FrageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Question generation failed: {0}")]
    Generation(String),

    #[error("Could not parse generator output: {0}")]
    ParseFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Generation already in progress for video: {0}")]
    GenerationBusy(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Video has no transcript: {0}")]
    NoTranscript(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Frage operations.
pub type Result<T> = std::result::Result<T, FrageError>;
