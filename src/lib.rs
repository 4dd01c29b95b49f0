//! Frage - Transcript-Grounded Quiz Questions
//!
//! Generates multiple-choice comprehension questions from video transcripts
//! for language learners, on demand and in the background.
//!
//! The name "Frage" is the German word for "question."
//!
//! # Overview
//!
//! Frage allows you to:
//! - Import video transcripts and split them into overlapping chunks
//! - Generate grounded multiple-choice questions with an LLM
//! - Keep every video's question set within a fixed cap
//! - Steer new generation toward under-covered chunks
//! - Serve questions and coverage analytics over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `chunking` - Sentence-bounded transcript chunking
//! - `coverage` - Chunk coverage ranking and recommendations
//! - `question` - Question model and validation types
//! - `generator` - LLM generation backends and output parsing
//! - `store` - Question store abstraction (SQLite, memory)
//! - `pipeline` - Generation round coordination
//! - `trigger` - Read-triggered background generation
//!
//! # Example
//!
//! ```rust,no_run
//! use frage::config::Settings;
//! use frage::pipeline::QuestionPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = QuestionPipeline::new(settings)?;
//!
//!     pipeline
//!         .import_video("abc123", "Markt und Sprache", "German", "Der Markt...")
//!         .await?;
//!     let outcome = pipeline.run_generation_round("abc123").await?;
//!     println!("Persisted {} questions", outcome.inserted);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod generator;
pub mod openai;
pub mod pipeline;
pub mod question;
pub mod store;
pub mod trigger;

pub use error::{FrageError, Result};
