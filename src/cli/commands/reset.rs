//! Reset command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::FrageError;
use crate::pipeline::QuestionPipeline;
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Run the reset command.
pub async fn run_reset(video_id: &str, yes: bool, settings: Settings) -> Result<()> {
    let pipeline = QuestionPipeline::new(settings)?;
    let store = pipeline.store();

    let current = store.question_count(video_id).await?;
    if !yes {
        Output::warning(&format!(
            "This deletes all {} questions for video '{}' and regenerates from scratch.",
            current, video_id
        ));
        if !prompt_confirm("Continue?")? {
            Output::info("Reset cancelled.");
            return Ok(());
        }
    }

    let spinner = Output::spinner("Regenerating questions...");
    let outcome = pipeline.reset_and_regenerate(video_id).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(outcome) => {
            Output::success(&format!(
                "Reset complete: {} fresh questions persisted.",
                outcome.inserted
            ));
        }
        Err(FrageError::GenerationBusy(_)) => {
            Output::warning("A generation round is already running for this video.");
            Output::info("Try again in a moment.");
        }
        Err(e) => {
            Output::error(&format!("Reset failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_confirm(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
