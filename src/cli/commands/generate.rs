//! Generate command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::FrageError;
use crate::pipeline::QuestionPipeline;
use anyhow::Result;

/// Run the generate command.
pub async fn run_generate(
    video_id: &str,
    count: Option<u32>,
    chunks: Option<Vec<usize>>,
    settings: Settings,
) -> Result<()> {
    let cap = settings.questions.max_per_video;
    let pipeline = QuestionPipeline::new(settings)?;

    Output::info(&format!("Generating questions for video: {}", video_id));

    let spinner = Output::spinner("Asking the model...");
    let outcome = pipeline
        .generate_manual(video_id, chunks.as_deref(), count)
        .await;
    spinner.finish_and_clear();

    match outcome {
        Ok(outcome) if outcome.at_cap => {
            Output::warning(&format!(
                "Video already has the maximum of {} questions.",
                cap
            ));
            Output::info("Use 'frage reset' to discard them and start over.");
        }
        Ok(outcome) => {
            if outcome.inserted == 0 {
                Output::warning("No new questions were persisted.");
            } else {
                Output::success(&format!(
                    "Generated {} new questions ({} of {} total)",
                    outcome.inserted, outcome.total, cap
                ));
            }
            if outcome.generated.len() > outcome.inserted {
                Output::info(&format!(
                    "{} candidates were dropped by the question cap.",
                    outcome.generated.len() - outcome.inserted
                ));
            }
            for summary in &outcome.generated {
                Output::list_item(&format!(
                    "{} (chunk {})",
                    summary.question,
                    summary.chunk + 1
                ));
            }
        }
        Err(FrageError::GenerationBusy(_)) => {
            Output::warning("A generation round is already running for this video.");
            Output::info("Try again in a moment.");
        }
        Err(e) => {
            Output::error(&format!("Generation failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
