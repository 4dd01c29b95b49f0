//! CLI module for Frage.

pub mod commands;
mod output;

pub use output::{coverage_bar, Output};

use clap::{Parser, Subcommand};

/// Frage - Transcript-Grounded Quiz Questions
///
/// Generates multiple-choice comprehension questions from video transcripts
/// for language learners. The name "Frage" is the German word for "question."
#[derive(Parser, Debug)]
#[command(name = "frage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Frage and verify configuration
    Init,

    /// Import a video transcript
    Import {
        /// Video ID to store the transcript under
        video_id: String,

        /// Path to a plain-text transcript file
        transcript: String,

        /// Video title (defaults to the video ID)
        #[arg(short, long)]
        title: Option<String>,

        /// Transcript language (defaults to the configured language)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// List imported videos
    List,

    /// Show the persisted questions for a video
    Questions {
        /// Video ID
        video_id: String,

        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Generate questions for a video
    Generate {
        /// Video ID
        video_id: String,

        /// Number of questions to request (defaults to the configured batch size)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Comma-separated chunk indices to target (defaults to coverage-based selection)
        #[arg(long, value_delimiter = ',')]
        chunks: Option<Vec<usize>>,
    },

    /// Show chunk coverage and duplicate analysis for a video
    Analytics {
        /// Video ID
        video_id: String,

        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Delete all questions for a video and regenerate from scratch
    Reset {
        /// Video ID
        video_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Start HTTP API server for integration with the learning platform
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "questions.batch_size")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
