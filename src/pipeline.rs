//! Question generation pipeline for Frage.
//!
//! Coordinates chunking, coverage analysis, generator calls and the
//! persistence gate. A round never partially fails: individual chunk
//! failures reduce the yield, and whatever candidates survive go through
//! the cap gate in one transaction.

use crate::chunking::{chunk_transcript, TranscriptChunk};
use crate::config::{Prompts, Settings};
use crate::coverage::{cold_start_chunks, select_chunks};
use crate::error::{FrageError, Result};
use crate::generator::parse::{parse_questions, ParsedQuestion};
use crate::generator::{GenerationRequest, OpenAiGenerator, QuestionGenerator};
use crate::question::{dedup_fingerprint, CandidateQuestion, ChunkTag};
use crate::store::{
    ChunkCount, DuplicateGroup, MemoryQuestionStore, QuestionStore, SqliteQuestionStore,
    VideoRecord,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Result of one generation round.
#[derive(Debug)]
pub struct RoundOutcome {
    pub video_id: String,
    /// Questions asked of the generator this round.
    pub requested: u32,
    /// Valid candidates the generator yielded.
    pub generated: usize,
    /// Rows actually persisted after the cap gate.
    pub inserted: usize,
    /// Question count after the round.
    pub total: u32,
    /// True when the video was already at the cap and nothing ran.
    pub at_cap: bool,
}

/// Result of an explicit (admin) generation request.
#[derive(Debug)]
pub struct ManualOutcome {
    pub inserted: usize,
    pub total: u32,
    pub at_cap: bool,
    /// Everything the generator produced, including candidates the cap
    /// gate then declined.
    pub generated: Vec<GeneratedSummary>,
}

/// Question text plus the chunk it was grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSummary {
    pub question: String,
    pub chunk: u32,
}

/// Coverage and duplicate analysis for one video.
#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub video_id: String,
    pub chunk_coverage: Vec<ChunkCount>,
    pub potential_duplicates: Vec<DuplicateGroup>,
    pub recommendation: String,
}

/// The main question generation pipeline.
pub struct QuestionPipeline {
    settings: Settings,
    prompts: Prompts,
    generator: Arc<dyn QuestionGenerator>,
    store: Arc<dyn QuestionStore>,
}

impl QuestionPipeline {
    /// Create a pipeline with components built from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let generator: Arc<dyn QuestionGenerator> =
            Arc::new(OpenAiGenerator::new(&settings.generator.model));

        let store: Arc<dyn QuestionStore> = match settings.store.provider.as_str() {
            "memory" => Arc::new(MemoryQuestionStore::new()),
            _ => Arc::new(SqliteQuestionStore::new(&settings.sqlite_path())?),
        };

        Ok(Self {
            settings,
            prompts,
            generator,
            store,
        })
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        generator: Arc<dyn QuestionGenerator>,
        store: Arc<dyn QuestionStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            generator,
            store,
        }
    }

    /// Get a reference to the question store.
    pub fn store(&self) -> Arc<dyn QuestionStore> {
        self.store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Hard cap on persisted questions per video.
    pub fn cap(&self) -> u32 {
        self.settings.questions.max_per_video
    }

    /// Age after which a generation claim may be taken over.
    pub fn claim_window(&self) -> Duration {
        Duration::from_secs(self.settings.server.claim_stale_secs)
    }

    /// Import or replace a video record.
    pub async fn import_video(
        &self,
        video_id: &str,
        title: &str,
        language: &str,
        transcript: &str,
    ) -> Result<VideoRecord> {
        if video_id.trim().is_empty() {
            return Err(FrageError::InvalidInput(
                "video_id must not be empty".to_string(),
            ));
        }

        let record = VideoRecord::new(
            video_id.trim().to_string(),
            title.to_string(),
            language.to_string(),
            transcript.to_string(),
        );
        self.store.upsert_video(&record).await?;
        info!(
            "Imported video {} ({} transcript chars)",
            record.video_id,
            record.transcript.chars().count()
        );
        Ok(record)
    }

    /// Generate candidate questions grounded in specific chunks.
    ///
    /// With no explicit targets the chunks come from coverage ranking, with
    /// a cold-start fallback; an explicitly empty target list also falls
    /// back to cold start, and out-of-range targets are skipped. Each chunk
    /// is one generator call; failures cost only that chunk's yield.
    #[instrument(skip(self, video, target_chunks), fields(video_id = %video.video_id))]
    pub async fn generate_for_chunks(
        &self,
        video: &VideoRecord,
        target_chunks: Option<&[usize]>,
        desired_count: u32,
    ) -> Result<Vec<CandidateQuestion>> {
        let chunks = chunk_transcript(
            &video.transcript,
            self.settings.chunking.max_chunk_chars,
            self.settings.chunking.overlap_chars,
        );
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let selected: Vec<usize> = match target_chunks {
            Some(targets) if targets.is_empty() => cold_start_chunks(chunks.len()),
            Some(targets) => {
                let valid: Vec<usize> = targets
                    .iter()
                    .copied()
                    .filter(|&i| i < chunks.len())
                    .collect();
                if valid.len() < targets.len() {
                    warn!(
                        "Ignoring {} out-of-range chunk targets for video {}",
                        targets.len() - valid.len(),
                        video.video_id
                    );
                }
                valid
            }
            None => {
                let counts = self.store.counts_by_chunk(&video.video_id).await?;
                select_chunks(chunks.len(), &counts, self.cap(), desired_count)
            }
        };

        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let questions_per_chunk = desired_count.div_ceil(selected.len() as u32);

        let existing = self.store.question_texts(&video.video_id).await?;
        let existing_block = if existing.is_empty() {
            String::new()
        } else {
            let list = existing
                .iter()
                .map(|q| format!("- {}", q))
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n\nExisting questions to avoid duplicating:\n{}", list)
        };

        let language = if video.language.trim().is_empty() {
            self.settings.questions.default_language.clone()
        } else {
            video.language.clone()
        };
        let question_types = self.settings.questions.question_types.join(", ");

        let mut candidates = Vec::new();
        for &index in &selected {
            let chunk = &chunks[index];

            let mut vars = HashMap::new();
            vars.insert("language".to_string(), language.clone());
            vars.insert("position".to_string(), chunk.part_label());
            vars.insert("count".to_string(), questions_per_chunk.to_string());
            vars.insert("excerpt".to_string(), chunk.text.clone());
            vars.insert("placement".to_string(), chunk.placement().to_string());
            vars.insert("existing_questions".to_string(), existing_block.clone());
            vars.insert("question_types".to_string(), question_types.clone());
            vars.insert(
                "difficulty".to_string(),
                self.settings.questions.difficulty.clone(),
            );

            let request = GenerationRequest {
                system_instruction: self
                    .prompts
                    .render_with_custom(&self.prompts.questions.system, &vars),
                prompt: self
                    .prompts
                    .render_with_custom(&self.prompts.questions.user, &vars),
                temperature: self.settings.generator.temperature,
                max_output_tokens: self.settings.generator.max_output_tokens,
            };

            let raw = match self.generator.complete(&request).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        "Generator failed for chunk {} of video {}: {}",
                        chunk.index, video.video_id, e
                    );
                    continue;
                }
            };

            let parsed = match parse_questions(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(
                        "Unusable generator output for chunk {} of video {}: {}",
                        chunk.index, video.video_id, e
                    );
                    continue;
                }
            };

            debug!("Chunk {} yielded {} valid questions", chunk.index, parsed.len());
            for question in parsed {
                candidates.push(tag_candidate(question, chunk));
            }
        }

        info!(
            "Generated {} candidate questions for video {} from {} chunks",
            candidates.len(),
            video.video_id,
            selected.len()
        );
        Ok(candidates)
    }

    /// Persist candidates through the cap gate. Returns how many landed.
    pub async fn commit_candidates(
        &self,
        video_id: &str,
        candidates: &[CandidateQuestion],
    ) -> Result<usize> {
        self.store
            .insert_questions(video_id, candidates, &self.generator.tag(), self.cap())
            .await
    }

    /// One background generation round: coverage-ranked chunks, batch-sized
    /// request, gated commit.
    ///
    /// The caller owns the generation claim; this method only re-checks the
    /// cap, which stays the backstop against overshoot.
    #[instrument(skip(self))]
    pub async fn run_generation_round(&self, video_id: &str) -> Result<RoundOutcome> {
        let cap = self.cap();
        let current = self.store.question_count(video_id).await?;
        if current >= cap {
            debug!("Video {} is already at the question cap", video_id);
            return Ok(RoundOutcome {
                video_id: video_id.to_string(),
                requested: 0,
                generated: 0,
                inserted: 0,
                total: current,
                at_cap: true,
            });
        }

        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| FrageError::VideoNotFound(video_id.to_string()))?;
        if !video.has_transcript() {
            return Err(FrageError::NoTranscript(video_id.to_string()));
        }

        let requested = self.settings.questions.batch_size.min(cap - current);
        let candidates = self.generate_for_chunks(&video, None, requested).await?;
        let inserted = self.commit_candidates(video_id, &candidates).await?;
        let total = self.store.question_count(video_id).await?;

        info!(
            "Round for video {}: requested {}, generated {}, persisted {} (total {})",
            video_id,
            requested,
            candidates.len(),
            inserted,
            total
        );
        Ok(RoundOutcome {
            video_id: video_id.to_string(),
            requested,
            generated: candidates.len(),
            inserted,
            total,
            at_cap: false,
        })
    }

    /// Explicit generation request with optional chunk targets and count.
    ///
    /// Claims the video's generation slot for the duration; a live claim
    /// from another round means the request is declined.
    #[instrument(skip(self, target_chunks))]
    pub async fn generate_manual(
        &self,
        video_id: &str,
        target_chunks: Option<&[usize]>,
        question_count: Option<u32>,
    ) -> Result<ManualOutcome> {
        let cap = self.cap();
        let current = self.store.question_count(video_id).await?;
        if current >= cap {
            return Ok(ManualOutcome {
                inserted: 0,
                total: current,
                at_cap: true,
                generated: Vec::new(),
            });
        }

        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| FrageError::VideoNotFound(video_id.to_string()))?;
        if !video.has_transcript() {
            return Err(FrageError::NoTranscript(video_id.to_string()));
        }

        if !self
            .store
            .claim_generation(video_id, self.claim_window())
            .await?
        {
            return Err(FrageError::GenerationBusy(video_id.to_string()));
        }

        let desired = question_count
            .unwrap_or(self.settings.questions.batch_size)
            .clamp(1, cap - current);

        let result: Result<ManualOutcome> = async {
            let candidates = self
                .generate_for_chunks(&video, target_chunks, desired)
                .await?;
            let inserted = self.commit_candidates(video_id, &candidates).await?;
            let total = self.store.question_count(video_id).await?;
            let generated = candidates
                .iter()
                .map(|c| GeneratedSummary {
                    question: c.question.clone(),
                    chunk: c.chunk.chunk_index,
                })
                .collect();
            Ok(ManualOutcome {
                inserted,
                total,
                at_cap: false,
                generated,
            })
        }
        .await;

        if let Err(e) = self.store.release_generation(video_id).await {
            warn!(
                "Failed to release generation claim for video {}: {}",
                video_id, e
            );
        }
        result
    }

    /// Delete all questions for a video and regenerate from ordinal 0.
    #[instrument(skip(self))]
    pub async fn reset_and_regenerate(&self, video_id: &str) -> Result<RoundOutcome> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| FrageError::VideoNotFound(video_id.to_string()))?;
        if !video.has_transcript() {
            return Err(FrageError::NoTranscript(video_id.to_string()));
        }

        if !self
            .store
            .claim_generation(video_id, self.claim_window())
            .await?
        {
            return Err(FrageError::GenerationBusy(video_id.to_string()));
        }

        let result: Result<RoundOutcome> = async {
            let deleted = self.store.delete_questions(video_id).await?;
            info!("Reset removed {} questions for video {}", deleted, video_id);

            let requested = self.settings.questions.batch_size.min(self.cap());
            let candidates = self.generate_for_chunks(&video, None, requested).await?;
            let inserted = self.commit_candidates(video_id, &candidates).await?;
            let total = self.store.question_count(video_id).await?;
            Ok(RoundOutcome {
                video_id: video_id.to_string(),
                requested,
                generated: candidates.len(),
                inserted,
                total,
                at_cap: false,
            })
        }
        .await;

        if let Err(e) = self.store.release_generation(video_id).await {
            warn!(
                "Failed to release generation claim for video {}: {}",
                video_id, e
            );
        }
        result
    }

    /// Coverage and duplicate analysis for one video.
    pub async fn analytics(&self, video_id: &str) -> Result<AnalyticsReport> {
        let chunk_coverage = self.store.counts_by_chunk(video_id).await?;
        let potential_duplicates = self.store.duplicate_groups(video_id).await?;
        let recommendation = crate::coverage::recommendation(&chunk_coverage);

        Ok(AnalyticsReport {
            video_id: video_id.to_string(),
            chunk_coverage,
            potential_duplicates,
            recommendation,
        })
    }
}

/// Attach chunk provenance and a dedup fingerprint to a parsed question.
fn tag_candidate(parsed: ParsedQuestion, chunk: &TranscriptChunk) -> CandidateQuestion {
    let dedup_hash = dedup_fingerprint(&parsed.question);
    CandidateQuestion {
        question: parsed.question,
        options: parsed.options,
        correct_answer: parsed.correct_answer,
        question_type: parsed.question_type,
        difficulty: parsed.difficulty,
        explanation: parsed.explanation,
        chunk: ChunkTag {
            chunk_index: chunk.index as u32,
            chunk_total: chunk.total_chunks as u32,
            chunk_position: chunk.start_offset as u32,
            chunk_text_preview: chunk.preview(100),
        },
        dedup_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Generator that replays canned responses and records every request.
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<GenerationRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn recorded_prompts(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.prompt.clone())
                .collect()
        }
    }

    #[async_trait]
    impl QuestionGenerator for ScriptedGenerator {
        async fn complete(&self, request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("[]".to_string()))
        }

        fn tag(&self) -> String {
            "scripted:test".to_string()
        }
    }

    fn payload(questions: &[&str]) -> String {
        let items: Vec<String> = questions
            .iter()
            .map(|q| {
                format!(
                    r#"{{
                        "question": "{}",
                        "options": [
                            {{"label": "A", "text": "eins"}},
                            {{"label": "B", "text": "zwei"}},
                            {{"label": "C", "text": "drei"}},
                            {{"label": "D", "text": "vier"}}
                        ],
                        "correct_answer": "A",
                        "type": "comprehension",
                        "difficulty": "medium",
                        "explanation": "Steht im Text."
                    }}"#,
                    q
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    // Four sentences of ~30 chars; max_chunk_chars 35 puts each in its own
    // chunk.
    const TRANSCRIPT: &str = "Der Zug fährt um acht Uhr ab. Wir steigen gemeinsam schnell ein. \
                              Die Fahrt dauert nur zwei Stunden. Am Ende sehen wir die Berge.";

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.chunking.max_chunk_chars = 35;
        settings.chunking.overlap_chars = 0;
        settings
    }

    async fn pipeline_with(
        responses: Vec<Result<String>>,
    ) -> (QuestionPipeline, Arc<ScriptedGenerator>, Arc<MemoryQuestionStore>) {
        let store = Arc::new(MemoryQuestionStore::new());
        let generator = ScriptedGenerator::new(responses);
        let pipeline = QuestionPipeline::with_components(
            test_settings(),
            Prompts::default(),
            generator.clone(),
            store.clone(),
        );

        pipeline
            .import_video("v1", "Zugfahrt", "German", TRANSCRIPT)
            .await
            .unwrap();
        (pipeline, generator, store)
    }

    #[tokio::test]
    async fn test_round_generates_and_persists() {
        let (pipeline, generator, _store) = pipeline_with(vec![
            Ok(payload(&["Wann fährt der Zug ab?", "Wer steigt ein?"])),
            Ok(payload(&["Wie lange dauert die Fahrt?"])),
            Ok(payload(&["Was sieht man am Ende?"])),
        ])
        .await;

        let outcome = pipeline.run_generation_round("v1").await.unwrap();
        assert_eq!(outcome.requested, 5);
        assert_eq!(outcome.generated, 4);
        assert_eq!(outcome.inserted, 4);
        assert_eq!(outcome.total, 4);
        assert!(!outcome.at_cap);

        // Batch of 5 selects ceil(5/2) = 3 chunks; fresh video ranks them
        // in index order.
        assert_eq!(generator.call_count(), 3);

        let questions = pipeline.store().questions_for_video("v1").await.unwrap();
        let ordinals: Vec<u32> = questions.iter().map(|q| q.ordinal_index).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert!(questions.iter().all(|q| q.chunk.chunk_index < 3));
        assert!(questions.iter().all(|q| q.generator_tag == "scripted:test"));
        assert!(questions.iter().all(|q| q.chunk.chunk_total == 4));
    }

    #[tokio::test]
    async fn test_failed_chunks_reduce_yield_without_aborting() {
        let (pipeline, _generator, _store) = pipeline_with(vec![
            Err(FrageError::Generation("timeout".to_string())),
            Ok(format!(
                "Sure! Here you go:\n{}\nHope that helps.",
                payload(&["Wie lange dauert die Fahrt?", "Wer steigt ein?"])
            )),
            Ok("I cannot produce questions for this text.".to_string()),
        ])
        .await;

        let outcome = pipeline.run_generation_round("v1").await.unwrap();
        assert_eq!(outcome.generated, 2);
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.total, 2);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_leaves_no_side_effects() {
        let (pipeline, _generator, store) = pipeline_with(vec![
            Err(FrageError::Generation("boom".to_string())),
            Err(FrageError::Generation("boom".to_string())),
            Err(FrageError::Generation("boom".to_string())),
        ])
        .await;

        let outcome = pipeline.run_generation_round("v1").await.unwrap();
        assert_eq!(outcome.generated, 0);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.question_count("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_round_requests_only_remaining_room() {
        let (pipeline, generator, _store) = pipeline_with(vec![
            Ok(payload(&["Frage A?", "Frage B?", "Frage C?"])),
            Ok(payload(&["Frage D?", "Frage E?", "Frage F?"])),
        ])
        .await;

        // Fill to 12 so only 3 slots remain.
        let seed: Vec<CandidateQuestion> = (0..12)
            .map(|i| {
                let parsed = parse_questions(&payload(&[&format!("Seed {}?", i)])).unwrap();
                let chunks = chunk_transcript(TRANSCRIPT, 35, 0);
                tag_candidate(parsed.into_iter().next().unwrap(), &chunks[3])
            })
            .collect();
        pipeline.commit_candidates("v1", &seed).await.unwrap();

        let outcome = pipeline.run_generation_round("v1").await.unwrap();
        // Room for 3 selects ceil(3/2) = 2 chunks; their six candidates are
        // trimmed to the remaining room.
        assert_eq!(outcome.requested, 3);
        assert_eq!(generator.call_count(), 2);
        assert_eq!(outcome.generated, 6);
        assert_eq!(outcome.inserted, 3);
        assert_eq!(outcome.total, 15);

        // At the cap the next round does not even call the generator.
        let outcome = pipeline.run_generation_round("v1").await.unwrap();
        assert!(outcome.at_cap);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_manual_targets_specific_chunks() {
        let (pipeline, generator, store) = pipeline_with(vec![Ok(payload(&[
            "Was passiert im dritten Teil?",
        ]))])
        .await;

        let outcome = pipeline
            .generate_manual("v1", Some(&[2, 99]), Some(4))
            .await
            .unwrap();

        // Index 99 is out of range and skipped; only chunk 2 is queried.
        assert_eq!(generator.call_count(), 1);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.generated.len(), 1);
        assert_eq!(outcome.generated[0].chunk, 2);

        // The claim was released: a new claim succeeds immediately.
        assert!(store
            .claim_generation("v1", Duration::from_secs(600))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_manual_with_empty_targets_uses_cold_start() {
        let (pipeline, generator, _store) = pipeline_with(vec![
            Ok(payload(&["Frage 1?"])),
            Ok(payload(&["Frage 2?"])),
            Ok(payload(&["Frage 3?"])),
        ])
        .await;

        let outcome = pipeline
            .generate_manual("v1", Some(&[]), Some(6))
            .await
            .unwrap();
        assert_eq!(generator.call_count(), 3);
        assert_eq!(outcome.inserted, 3);
    }

    #[tokio::test]
    async fn test_manual_declined_while_claim_is_live() {
        let (pipeline, generator, store) = pipeline_with(vec![Ok(payload(&["Frage?"]))]).await;

        assert!(store
            .claim_generation("v1", Duration::from_secs(600))
            .await
            .unwrap());

        let err = pipeline
            .generate_manual("v1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FrageError::GenerationBusy(_)));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_regenerates_from_ordinal_zero() {
        let (pipeline, _generator, store) = pipeline_with(vec![
            Ok(payload(&["Alte Frage?"])),
            Ok(payload(&["Neue Frage 1?", "Neue Frage 2?"])),
            Ok(payload(&["Neue Frage 3?"])),
            Ok(payload(&["Neue Frage 4?"])),
        ])
        .await;

        // First round seeds one question from one payload.
        pipeline
            .generate_manual("v1", Some(&[0]), Some(1))
            .await
            .unwrap();
        assert_eq!(store.question_count("v1").await.unwrap(), 1);

        let outcome = pipeline.reset_and_regenerate("v1").await.unwrap();
        assert_eq!(outcome.inserted, 4);
        assert_eq!(outcome.total, 4);

        let questions = store.questions_for_video("v1").await.unwrap();
        let ordinals: Vec<u32> = questions.iter().map(|q| q.ordinal_index).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert!(questions.iter().all(|q| q.question.starts_with("Neue")));
    }

    #[tokio::test]
    async fn test_prompt_carries_context_and_existing_questions() {
        let (pipeline, generator, _store) = pipeline_with(vec![
            Ok(payload(&["Wann fährt der Zug ab?"])),
            Ok(payload(&["Wer steigt ein?"])),
        ])
        .await;

        pipeline
            .generate_manual("v1", Some(&[0]), Some(1))
            .await
            .unwrap();
        pipeline
            .generate_manual("v1", Some(&[1]), Some(1))
            .await
            .unwrap();

        let prompts = generator.recorded_prompts();
        assert_eq!(prompts.len(), 2);

        // First prompt: excerpt, position label and no dedup block yet.
        assert!(prompts[0].contains("Der Zug fährt um acht Uhr ab."));
        assert!(prompts[0].contains("Part 1 of 4"));
        assert!(prompts[0].contains("the beginning"));
        assert!(prompts[0].contains("German"));
        assert!(!prompts[0].contains("Existing questions"));

        // Second prompt lists the persisted question verbatim.
        assert!(prompts[1].contains("Existing questions to avoid duplicating:"));
        assert!(prompts[1].contains("- Wann fährt der Zug ab?"));
        assert!(prompts[1].contains("Part 2 of 4"));
        assert!(prompts[1].contains("the middle"));
    }

    #[tokio::test]
    async fn test_missing_video_and_missing_transcript() {
        let (pipeline, _generator, _store) = pipeline_with(vec![]).await;

        let err = pipeline.run_generation_round("ghost").await.unwrap_err();
        assert!(matches!(err, FrageError::VideoNotFound(_)));

        pipeline
            .import_video("leer", "Leer", "German", "   ")
            .await
            .unwrap();
        let err = pipeline.run_generation_round("leer").await.unwrap_err();
        assert!(matches!(err, FrageError::NoTranscript(_)));
    }

    #[tokio::test]
    async fn test_analytics_report() {
        let (pipeline, _generator, _store) = pipeline_with(vec![
            Ok(payload(&["Frage eins?", "Frage eins!?"])),
            Ok(payload(&["Frage zwei?"])),
        ])
        .await;

        pipeline
            .generate_manual("v1", Some(&[0]), Some(2))
            .await
            .unwrap();
        pipeline
            .generate_manual("v1", Some(&[1]), Some(1))
            .await
            .unwrap();

        let report = pipeline.analytics("v1").await.unwrap();
        assert_eq!(report.chunk_coverage.len(), 2);
        assert_eq!(report.chunk_coverage[0].question_count, 2);
        assert_eq!(report.potential_duplicates.len(), 1);
        assert_eq!(report.potential_duplicates[0].questions.len(), 2);
        assert!(!report.recommendation.is_empty());
    }
}
