//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::QuestionPipeline;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let cap = settings.questions.max_per_video;
    let pipeline = QuestionPipeline::new(settings)?;

    match pipeline.store().list_videos().await {
        Ok(videos) => {
            if videos.is_empty() {
                Output::info(
                    "No videos imported yet. Use 'frage import <video-id> <file>' to add one.",
                );
            } else {
                Output::header(&format!("Imported Videos ({})", videos.len()));
                println!();

                for video in &videos {
                    Output::video_info(
                        &video.title,
                        &video.video_id,
                        &video.language,
                        video.question_count,
                    );
                }

                let total_questions: u32 = videos.iter().map(|v| v.question_count).sum();
                let full: usize = videos
                    .iter()
                    .filter(|v| v.question_count >= cap)
                    .count();
                println!();
                Output::kv("Total videos", &videos.len().to_string());
                Output::kv("Total questions", &total_questions.to_string());
                Output::kv("At question cap", &full.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
