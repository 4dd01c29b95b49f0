//! In-memory question store implementation.
//!
//! Useful for testing and ephemeral setups.

use super::{ChunkCount, DuplicateGroup, QuestionStore, VideoRecord, VideoSummary};
use crate::error::Result;
use crate::question::{CandidateQuestion, Question};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct ClaimState {
    in_progress: bool,
    claimed_at: Option<Instant>,
}

#[derive(Default)]
struct Inner {
    videos: HashMap<String, VideoRecord>,
    /// Questions per video, kept in ordinal order.
    questions: HashMap<String, Vec<Question>>,
    claims: HashMap<String, ClaimState>,
}

/// In-memory question store.
pub struct MemoryQuestionStore {
    inner: RwLock<Inner>,
}

impl MemoryQuestionStore {
    /// Create a new in-memory question store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryQuestionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn upsert_video(&self, video: &VideoRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.videos.insert(video.video_id.clone(), video.clone());
        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.videos.get(video_id).cloned())
    }

    async fn list_videos(&self) -> Result<Vec<VideoSummary>> {
        let inner = self.inner.read().unwrap();

        let mut videos: Vec<VideoSummary> = inner
            .videos
            .values()
            .map(|v| VideoSummary {
                video_id: v.video_id.clone(),
                title: v.title.clone(),
                language: v.language.clone(),
                question_count: inner
                    .questions
                    .get(&v.video_id)
                    .map(|qs| qs.len() as u32)
                    .unwrap_or(0),
                imported_at: v.imported_at,
            })
            .collect();
        videos.sort_by(|a, b| b.imported_at.cmp(&a.imported_at));
        Ok(videos)
    }

    async fn insert_questions(
        &self,
        video_id: &str,
        candidates: &[CandidateQuestion],
        generator_tag: &str,
        cap: u32,
    ) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let list = inner.questions.entry(video_id.to_string()).or_default();

        let current = list.len() as u32;
        let room = cap.saturating_sub(current) as usize;
        let accepted = candidates.len().min(room);

        for (offset, candidate) in candidates[..accepted].iter().enumerate() {
            list.push(Question::from_candidate(
                video_id,
                current + offset as u32,
                candidate.clone(),
                generator_tag,
            ));
        }
        Ok(accepted)
    }

    async fn questions_for_video(&self, video_id: &str) -> Result<Vec<Question>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.questions.get(video_id).cloned().unwrap_or_default())
    }

    async fn question_count(&self, video_id: &str) -> Result<u32> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .questions
            .get(video_id)
            .map(|qs| qs.len() as u32)
            .unwrap_or(0))
    }

    async fn question_texts(&self, video_id: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .questions
            .get(video_id)
            .map(|qs| qs.iter().map(|q| q.question.clone()).collect())
            .unwrap_or_default())
    }

    async fn counts_by_chunk(&self, video_id: &str) -> Result<Vec<ChunkCount>> {
        let inner = self.inner.read().unwrap();

        let mut by_chunk: HashMap<u32, u32> = HashMap::new();
        if let Some(questions) = inner.questions.get(video_id) {
            for q in questions {
                *by_chunk.entry(q.chunk.chunk_index).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<ChunkCount> = by_chunk
            .into_iter()
            .map(|(chunk_index, question_count)| ChunkCount {
                chunk_index,
                question_count,
            })
            .collect();
        counts.sort_by_key(|c| c.chunk_index);
        Ok(counts)
    }

    async fn duplicate_groups(&self, video_id: &str) -> Result<Vec<DuplicateGroup>> {
        let inner = self.inner.read().unwrap();

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        if let Some(questions) = inner.questions.get(video_id) {
            for q in questions {
                match groups.iter_mut().find(|g| g.dedup_hash == q.dedup_hash) {
                    Some(group) => group.questions.push(q.question.clone()),
                    None => groups.push(DuplicateGroup {
                        dedup_hash: q.dedup_hash.clone(),
                        questions: vec![q.question.clone()],
                    }),
                }
            }
        }
        groups.retain(|g| g.questions.len() > 1);
        Ok(groups)
    }

    async fn delete_questions(&self, video_id: &str) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner
            .questions
            .remove(video_id)
            .map(|qs| qs.len())
            .unwrap_or(0))
    }

    async fn claim_generation(&self, video_id: &str, stale_after: Duration) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        let claim = inner
            .claims
            .entry(video_id.to_string())
            .or_insert(ClaimState {
                in_progress: false,
                claimed_at: None,
            });

        let stale = match claim.claimed_at {
            Some(at) => at.elapsed() >= stale_after,
            None => true,
        };
        if claim.in_progress && !stale {
            return Ok(false);
        }

        claim.in_progress = true;
        claim.claimed_at = Some(Instant::now());
        Ok(true)
    }

    async fn release_generation(&self, video_id: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.claims.insert(
            video_id.to_string(),
            ClaimState {
                in_progress: false,
                claimed_at: None,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{
        dedup_fingerprint, AnswerOption, ChunkTag, Difficulty, OptionLabel, QuestionType,
    };

    fn candidate(text: &str, chunk_index: u32) -> CandidateQuestion {
        CandidateQuestion {
            question: text.to_string(),
            options: [
                AnswerOption {
                    label: OptionLabel::A,
                    text: "eins".to_string(),
                },
                AnswerOption {
                    label: OptionLabel::B,
                    text: "zwei".to_string(),
                },
                AnswerOption {
                    label: OptionLabel::C,
                    text: "drei".to_string(),
                },
                AnswerOption {
                    label: OptionLabel::D,
                    text: "vier".to_string(),
                },
            ],
            correct_answer: OptionLabel::A,
            question_type: QuestionType::Comprehension,
            difficulty: Difficulty::Medium,
            explanation: String::new(),
            chunk: ChunkTag {
                chunk_index,
                chunk_total: 3,
                chunk_position: 0,
                chunk_text_preview: "Vorschau...".to_string(),
            },
            dedup_hash: dedup_fingerprint(text),
        }
    }

    #[tokio::test]
    async fn test_memory_store_flow() {
        let store = MemoryQuestionStore::new();

        let video = VideoRecord::new(
            "v1".to_string(),
            "Test".to_string(),
            "German".to_string(),
            "Eins. Zwei. Drei.".to_string(),
        );
        store.upsert_video(&video).await.unwrap();

        let batch: Vec<CandidateQuestion> = (0..4)
            .map(|i| candidate(&format!("Frage {}?", i), i % 2))
            .collect();
        let inserted = store.insert_questions("v1", &batch, "test", 3).await.unwrap();
        assert_eq!(inserted, 3);

        let questions = store.questions_for_video("v1").await.unwrap();
        let ordinals: Vec<u32> = questions.iter().map(|q| q.ordinal_index).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);

        let counts = store.counts_by_chunk("v1").await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].chunk_index, 0);
        assert_eq!(counts[0].question_count, 2);

        let videos = store.list_videos().await.unwrap();
        assert_eq!(videos[0].question_count, 3);

        assert_eq!(store.delete_questions("v1").await.unwrap(), 3);
        assert_eq!(store.question_count("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_claims_are_exclusive() {
        let store = MemoryQuestionStore::new();
        let window = Duration::from_secs(600);

        assert!(store.claim_generation("v1", window).await.unwrap());
        assert!(!store.claim_generation("v1", window).await.unwrap());

        store.release_generation("v1").await.unwrap();
        assert!(store.claim_generation("v1", window).await.unwrap());

        // Zero window: any existing claim counts as stale.
        assert!(store.claim_generation("v1", Duration::ZERO).await.unwrap());
    }
}
