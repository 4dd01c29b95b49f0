//! Import command implementation.

use crate::chunking::chunk_transcript;
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::QuestionPipeline;
use anyhow::Result;

/// Run the import command.
pub async fn run_import(
    video_id: &str,
    transcript_path: &str,
    title: Option<String>,
    language: Option<String>,
    settings: Settings,
) -> Result<()> {
    let text = std::fs::read_to_string(transcript_path).map_err(|e| {
        anyhow::anyhow!("Failed to read transcript file '{}': {}", transcript_path, e)
    })?;

    if text.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "Transcript file is empty: {}",
            transcript_path
        ));
    }

    let title = title.unwrap_or_else(|| video_id.to_string());
    let language = language.unwrap_or_else(|| settings.questions.default_language.clone());
    let chunks = chunk_transcript(
        &text,
        settings.chunking.max_chunk_chars,
        settings.chunking.overlap_chars,
    );

    let pipeline = QuestionPipeline::new(settings)?;

    match pipeline
        .import_video(video_id, &title, &language, &text)
        .await
    {
        Ok(record) => {
            Output::success(&format!("Imported video '{}'", record.title));
            Output::kv("Video ID", &record.video_id);
            Output::kv("Language", &record.language);
            Output::kv(
                "Transcript",
                &format!("{} characters", record.transcript.chars().count()),
            );
            Output::kv("Chunks", &chunks.len().to_string());
            println!();
            Output::info(&format!(
                "Generate questions with: frage generate {}",
                record.video_id
            ));
        }
        Err(e) => {
            Output::error(&format!("Failed to import: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
