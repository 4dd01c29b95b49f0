//! Analytics command implementation.

use crate::chunking::chunk_transcript;
use crate::cli::{coverage_bar, Output};
use crate::config::Settings;
use crate::pipeline::QuestionPipeline;
use anyhow::Result;

/// Run the analytics command.
pub async fn run_analytics(video_id: &str, json: bool, settings: Settings) -> Result<()> {
    let max_chunk_chars = settings.chunking.max_chunk_chars;
    let overlap_chars = settings.chunking.overlap_chars;
    let pipeline = QuestionPipeline::new(settings)?;
    let store = pipeline.store();

    let video = match store.get_video(video_id).await? {
        Some(video) => video,
        None => {
            Output::error(&format!("Video not found: {}", video_id));
            return Err(anyhow::anyhow!("video not found: {}", video_id));
        }
    };

    let report = pipeline.analytics(video_id).await?;

    if json {
        let payload = serde_json::json!({
            "videoId": report.video_id,
            "chunkCoverage": report.chunk_coverage,
            "potentialDuplicates": report.potential_duplicates,
            "recommendation": report.recommendation,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let total_chunks = chunk_transcript(&video.transcript, max_chunk_chars, overlap_chars).len();

    Output::header(&format!("Question Analytics for '{}'", video.title));
    println!();
    Output::kv(
        "Coverage",
        &coverage_bar(&report.chunk_coverage, total_chunks),
    );
    for entry in &report.chunk_coverage {
        Output::kv(
            &format!("Chunk {}", entry.chunk_index + 1),
            &format!("{} questions", entry.question_count),
        );
    }

    println!();
    if report.potential_duplicates.is_empty() {
        Output::success("No potential duplicates.");
    } else {
        Output::warning(&format!(
            "{} potential duplicate groups:",
            report.potential_duplicates.len()
        ));
        for group in &report.potential_duplicates {
            for question in &group.questions {
                Output::list_item(question);
            }
            println!();
        }
    }

    Output::info(&report.recommendation);

    Ok(())
}
