//! Questions command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::QuestionPipeline;
use anyhow::Result;

/// Run the questions command.
pub async fn run_questions(video_id: &str, json: bool, settings: Settings) -> Result<()> {
    let cap = settings.questions.max_per_video;
    let pipeline = QuestionPipeline::new(settings)?;
    let store = pipeline.store();

    let video = match store.get_video(video_id).await? {
        Some(video) => video,
        None => {
            Output::error(&format!("Video not found: {}", video_id));
            return Err(anyhow::anyhow!("video not found: {}", video_id));
        }
    };

    let questions = store.questions_for_video(video_id).await?;
    let distribution = store.counts_by_chunk(video_id).await?;

    if json {
        let payload = serde_json::json!({
            "videoId": video.video_id,
            "questions": questions,
            "totalQuestions": questions.len(),
            "chunkDistribution": distribution,
            "maxQuestions": cap,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    Output::header(&format!("Questions for '{}'", video.title));
    if questions.is_empty() {
        println!();
        Output::info("No questions yet. Use 'frage generate' to create some.");
        return Ok(());
    }

    for question in &questions {
        Output::question_block(question);
    }

    println!();
    Output::kv("Total", &format!("{} of {}", questions.len(), cap));

    Ok(())
}
