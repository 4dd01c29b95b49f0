//! Read-triggered background question generation.
//!
//! Reads stay fast: a read that finds a video below the question cap only
//! tries to claim the video's generation slot and, on success, spawns one
//! round in the background. Concurrent reads on the same video lose the
//! claim and return immediately.

use crate::pipeline::QuestionPipeline;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawns generation rounds off question read traffic.
pub struct TriggerController {
    pipeline: Arc<QuestionPipeline>,
}

impl TriggerController {
    pub fn new(pipeline: Arc<QuestionPipeline>) -> Self {
        Self { pipeline }
    }

    /// React to a questions read for a video.
    ///
    /// Returns the handle of the spawned round, or None when nothing was
    /// started (cap reached, auto-generation disabled, or another round
    /// holds the claim). The claim is released when the round finishes,
    /// whatever its outcome; abandoned claims age out after the configured
    /// staleness window.
    pub async fn on_read(&self, video_id: &str, current_count: u32) -> Option<JoinHandle<()>> {
        if !self.pipeline.settings().questions.auto_generate {
            return None;
        }
        if current_count >= self.pipeline.cap() {
            return None;
        }

        let store = self.pipeline.store();
        let claimed = match store
            .claim_generation(video_id, self.pipeline.claim_window())
            .await
        {
            Ok(claimed) => claimed,
            Err(e) => {
                warn!("Could not claim generation for video {}: {}", video_id, e);
                false
            }
        };
        if !claimed {
            debug!("Generation already claimed for video {}", video_id);
            return None;
        }

        let pipeline = self.pipeline.clone();
        let video_id = video_id.to_string();
        Some(tokio::spawn(async move {
            match pipeline.run_generation_round(&video_id).await {
                Ok(outcome) => {
                    info!(
                        "Background round for video {} persisted {} questions (total {})",
                        video_id, outcome.inserted, outcome.total
                    );
                }
                Err(e) => {
                    warn!("Background generation failed for video {}: {}", video_id, e);
                }
            }
            if let Err(e) = pipeline.store().release_generation(&video_id).await {
                warn!(
                    "Failed to release generation claim for video {}: {}",
                    video_id, e
                );
            }
        }))
    }
}
