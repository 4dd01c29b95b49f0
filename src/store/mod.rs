//! Question store abstraction for Frage.
//!
//! Provides a trait-based interface over the persisted state: videos,
//! their questions, and per-video generation claims.

mod memory;
mod sqlite;

pub use memory::MemoryQuestionStore;
pub use sqlite::SqliteQuestionStore;

use crate::error::Result;
use crate::question::{CandidateQuestion, Question};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A video whose transcript feeds the question pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// External video ID.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Language of the transcript (e.g. "German").
    pub language: String,
    /// Full transcript text. The pipeline never mutates it.
    pub transcript: String,
    /// When the video was imported.
    pub imported_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a record stamped with the current time.
    pub fn new(video_id: String, title: String, language: String, transcript: String) -> Self {
        Self {
            video_id,
            title,
            language,
            transcript,
            imported_at: Utc::now(),
        }
    }

    /// Whether there is any transcript text to generate from.
    pub fn has_transcript(&self) -> bool {
        !self.transcript.trim().is_empty()
    }
}

/// Summary information about a stored video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub language: String,
    /// Number of persisted questions.
    pub question_count: u32,
    pub imported_at: DateTime<Utc>,
}

/// Number of questions grounded in one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCount {
    pub chunk_index: u32,
    pub question_count: u32,
}

/// Questions sharing a dedup fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub dedup_hash: String,
    /// Question texts in ordinal order.
    pub questions: Vec<String>,
}

/// Trait for question store implementations.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Insert or replace a video record.
    async fn upsert_video(&self, video: &VideoRecord) -> Result<()>;

    /// Fetch a video with its transcript.
    async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>>;

    /// List stored videos with question counts, newest first.
    async fn list_videos(&self) -> Result<Vec<VideoSummary>>;

    /// Persist candidates for a video, gated by the cap.
    ///
    /// Re-reads the current count and commits at most `cap - current`
    /// candidates, assigning contiguous ordinals from the current count, all
    /// in one transaction. Committing the same ordinals twice is a no-op.
    /// Returns how many rows were actually inserted.
    async fn insert_questions(
        &self,
        video_id: &str,
        candidates: &[CandidateQuestion],
        generator_tag: &str,
        cap: u32,
    ) -> Result<usize>;

    /// All questions for a video in ordinal order.
    async fn questions_for_video(&self, video_id: &str) -> Result<Vec<Question>>;

    /// Number of persisted questions for a video.
    async fn question_count(&self, video_id: &str) -> Result<u32>;

    /// Question texts in ordinal order, for prompt-level dedup context.
    async fn question_texts(&self, video_id: &str) -> Result<Vec<String>>;

    /// Questions per chunk, ascending by chunk index. Chunks without
    /// questions are absent.
    async fn counts_by_chunk(&self, video_id: &str) -> Result<Vec<ChunkCount>>;

    /// Groups of questions sharing a dedup fingerprint (2 or more members).
    async fn duplicate_groups(&self, video_id: &str) -> Result<Vec<DuplicateGroup>>;

    /// Delete all questions for a video. Returns how many were removed.
    async fn delete_questions(&self, video_id: &str) -> Result<usize>;

    /// Try to claim the video's generation slot.
    ///
    /// Succeeds when the slot is idle or its claim is older than
    /// `stale_after`. Returns false when another round holds a live claim;
    /// the caller must not generate in that case.
    async fn claim_generation(&self, video_id: &str, stale_after: Duration) -> Result<bool>;

    /// Release the video's generation slot unconditionally.
    async fn release_generation(&self, video_id: &str) -> Result<()>;
}
