//! SQLite-based question store implementation.
//!
//! The connection mutex plus a transaction per commit is the concurrency
//! unit: the cap check, ordinal assignment and inserts of one generation
//! round happen under the same guard, so concurrent rounds cannot interleave
//! between the count and the writes.

use super::{ChunkCount, DuplicateGroup, QuestionStore, VideoRecord, VideoSummary};
use crate::error::{FrageError, Result};
use crate::question::{
    AnswerOption, CandidateQuestion, ChunkTag, Difficulty, OptionLabel, Question, QuestionType,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS videos (
        video_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        language TEXT NOT NULL,
        transcript TEXT NOT NULL,
        imported_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS questions (
        video_id TEXT NOT NULL,
        ordinal_index INTEGER NOT NULL,
        question TEXT NOT NULL,
        options_json TEXT NOT NULL,
        correct_answer TEXT NOT NULL,
        question_type TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        explanation TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        chunk_total INTEGER NOT NULL,
        chunk_position INTEGER NOT NULL,
        chunk_text_preview TEXT NOT NULL,
        dedup_hash TEXT NOT NULL,
        generator_tag TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (video_id, ordinal_index)
    );

    CREATE INDEX IF NOT EXISTS idx_questions_video_chunk ON questions(video_id, chunk_index);
    CREATE INDEX IF NOT EXISTS idx_questions_video_hash ON questions(video_id, dedup_hash);

    CREATE TABLE IF NOT EXISTS generation_state (
        video_id TEXT PRIMARY KEY,
        status TEXT NOT NULL DEFAULT 'idle',
        claimed_at TEXT
    );
"#;

/// SQLite-based question store.
pub struct SqliteQuestionStore {
    conn: Mutex<Connection>,
}

impl SqliteQuestionStore {
    /// Create a new SQLite question store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite question store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite question store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FrageError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    let options_json: String = row.get(3)?;
    let options: [AnswerOption; 4] = serde_json::from_str(&options_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let correct_str: String = row.get(4)?;
    let correct_answer = OptionLabel::parse(&correct_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown option label: {}", correct_str).into(),
        )
    })?;

    let type_str: String = row.get(5)?;
    let difficulty_str: String = row.get(6)?;
    let created_str: String = row.get(14)?;

    Ok(Question {
        video_id: row.get(0)?,
        ordinal_index: row.get(1)?,
        question: row.get(2)?,
        options,
        correct_answer,
        question_type: QuestionType::parse_lossy(&type_str),
        difficulty: Difficulty::parse_lossy(&difficulty_str),
        explanation: row.get(7)?,
        chunk: ChunkTag {
            chunk_index: row.get(8)?,
            chunk_total: row.get(9)?,
            chunk_position: row.get(10)?,
            chunk_text_preview: row.get(11)?,
        },
        dedup_hash: row.get(12)?,
        generator_tag: row.get(13)?,
        created_at: parse_timestamp(&created_str),
    })
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    #[instrument(skip(self, video), fields(video_id = %video.video_id))]
    async fn upsert_video(&self, video: &VideoRecord) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO videos (video_id, title, language, transcript, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                video.video_id,
                video.title,
                video.language,
                video.transcript,
                video.imported_at.to_rfc3339(),
            ],
        )?;

        debug!("Stored video {}", video.video_id);
        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        let conn = self.lock()?;

        let video = conn.query_row(
            "SELECT video_id, title, language, transcript, imported_at FROM videos WHERE video_id = ?1",
            params![video_id],
            |row| {
                let imported_str: String = row.get(4)?;
                Ok(VideoRecord {
                    video_id: row.get(0)?,
                    title: row.get(1)?,
                    language: row.get(2)?,
                    transcript: row.get(3)?,
                    imported_at: parse_timestamp(&imported_str),
                })
            },
        );

        match video {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_videos(&self) -> Result<Vec<VideoSummary>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT v.video_id, v.title, v.language, COUNT(q.video_id) AS question_count,
                   v.imported_at
            FROM videos v
            LEFT JOIN questions q ON v.video_id = q.video_id
            GROUP BY v.video_id
            ORDER BY v.imported_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let imported_str: String = row.get(4)?;
            Ok(VideoSummary {
                video_id: row.get(0)?,
                title: row.get(1)?,
                language: row.get(2)?,
                question_count: row.get(3)?,
                imported_at: parse_timestamp(&imported_str),
            })
        })?;

        let mut videos = Vec::new();
        for row in rows {
            videos.push(row?);
        }
        Ok(videos)
    }

    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    async fn insert_questions(
        &self,
        video_id: &str,
        candidates: &[CandidateQuestion],
        generator_tag: &str,
        cap: u32,
    ) -> Result<usize> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let current: u32 = tx.query_row(
            "SELECT COUNT(*) FROM questions WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;

        let room = cap.saturating_sub(current) as usize;
        let accepted = candidates.len().min(room);
        if accepted < candidates.len() {
            debug!(
                "Cap {} leaves room for {} of {} candidates for video {}",
                cap,
                accepted,
                candidates.len(),
                video_id
            );
        }

        let mut inserted = 0usize;
        for (offset, candidate) in candidates[..accepted].iter().enumerate() {
            let question = Question::from_candidate(
                video_id,
                current + offset as u32,
                candidate.clone(),
                generator_tag,
            );
            let options_json = serde_json::to_string(&question.options)?;

            inserted += tx.execute(
                r#"
                INSERT OR IGNORE INTO questions
                (video_id, ordinal_index, question, options_json, correct_answer,
                 question_type, difficulty, explanation, chunk_index, chunk_total,
                 chunk_position, chunk_text_preview, dedup_hash, generator_tag, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                "#,
                params![
                    question.video_id,
                    question.ordinal_index,
                    question.question,
                    options_json,
                    question.correct_answer.as_str(),
                    question.question_type.as_str(),
                    question.difficulty.as_str(),
                    question.explanation,
                    question.chunk.chunk_index,
                    question.chunk.chunk_total,
                    question.chunk.chunk_position,
                    question.chunk.chunk_text_preview,
                    question.dedup_hash,
                    question.generator_tag,
                    question.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!(
            "Persisted {} of {} candidate questions for video {} (had {})",
            inserted,
            candidates.len(),
            video_id,
            current
        );
        Ok(inserted)
    }

    async fn questions_for_video(&self, video_id: &str) -> Result<Vec<Question>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, ordinal_index, question, options_json, correct_answer,
                   question_type, difficulty, explanation, chunk_index, chunk_total,
                   chunk_position, chunk_text_preview, dedup_hash, generator_tag, created_at
            FROM questions
            WHERE video_id = ?1
            ORDER BY ordinal_index
            "#,
        )?;

        let rows = stmt.query_map(params![video_id], |row| row_to_question(row))?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }

    async fn question_count(&self, video_id: &str) -> Result<u32> {
        let conn = self.lock()?;

        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM questions WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn question_texts(&self, video_id: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT question FROM questions WHERE video_id = ?1 ORDER BY ordinal_index",
        )?;
        let rows = stmt.query_map(params![video_id], |row| row.get(0))?;

        let mut texts = Vec::new();
        for row in rows {
            texts.push(row?);
        }
        Ok(texts)
    }

    async fn counts_by_chunk(&self, video_id: &str) -> Result<Vec<ChunkCount>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT chunk_index, COUNT(*) AS question_count
            FROM questions
            WHERE video_id = ?1
            GROUP BY chunk_index
            ORDER BY chunk_index
            "#,
        )?;

        let rows = stmt.query_map(params![video_id], |row| {
            Ok(ChunkCount {
                chunk_index: row.get(0)?,
                question_count: row.get(1)?,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    async fn duplicate_groups(&self, video_id: &str) -> Result<Vec<DuplicateGroup>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT dedup_hash, question FROM questions WHERE video_id = ?1 ORDER BY ordinal_index",
        )?;
        let rows = stmt.query_map(params![video_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        for row in rows {
            let (dedup_hash, question) = row?;
            match groups.iter_mut().find(|g| g.dedup_hash == dedup_hash) {
                Some(group) => group.questions.push(question),
                None => groups.push(DuplicateGroup {
                    dedup_hash,
                    questions: vec![question],
                }),
            }
        }
        groups.retain(|g| g.questions.len() > 1);
        Ok(groups)
    }

    #[instrument(skip(self))]
    async fn delete_questions(&self, video_id: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM questions WHERE video_id = ?1",
            params![video_id],
        )?;

        info!("Deleted {} questions for video {}", deleted, video_id);
        Ok(deleted)
    }

    #[instrument(skip(self, stale_after))]
    async fn claim_generation(&self, video_id: &str, stale_after: Duration) -> Result<bool> {
        let conn = self.lock()?;
        let now = Utc::now();
        let cutoff = now - stale_after;

        conn.execute(
            "INSERT OR IGNORE INTO generation_state (video_id, status, claimed_at) VALUES (?1, 'idle', NULL)",
            params![video_id],
        )?;

        // Conditional takeover: only an idle slot or a stale claim may be
        // taken. Rows-changed tells us whether we won.
        let claimed = conn.execute(
            r#"
            UPDATE generation_state
            SET status = 'in_progress', claimed_at = ?2
            WHERE video_id = ?1
              AND (status = 'idle' OR claimed_at IS NULL OR claimed_at < ?3)
            "#,
            params![video_id, now.to_rfc3339(), cutoff.to_rfc3339()],
        )?;

        if claimed == 1 {
            debug!("Claimed generation slot for video {}", video_id);
        } else {
            debug!("Generation slot for video {} already claimed", video_id);
        }
        Ok(claimed == 1)
    }

    async fn release_generation(&self, video_id: &str) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "UPDATE generation_state SET status = 'idle', claimed_at = NULL WHERE video_id = ?1",
            params![video_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::dedup_fingerprint;

    fn sample_options() -> [AnswerOption; 4] {
        [
            AnswerOption {
                label: OptionLabel::A,
                text: "der".to_string(),
            },
            AnswerOption {
                label: OptionLabel::B,
                text: "die".to_string(),
            },
            AnswerOption {
                label: OptionLabel::C,
                text: "das".to_string(),
            },
            AnswerOption {
                label: OptionLabel::D,
                text: "den".to_string(),
            },
        ]
    }

    fn candidate(text: &str, chunk_index: u32) -> CandidateQuestion {
        CandidateQuestion {
            question: text.to_string(),
            options: sample_options(),
            correct_answer: OptionLabel::C,
            question_type: QuestionType::Grammar,
            difficulty: Difficulty::Medium,
            explanation: "Haus ist ein Neutrum.".to_string(),
            chunk: ChunkTag {
                chunk_index,
                chunk_total: 4,
                chunk_position: chunk_index * 100,
                chunk_text_preview: "Der Zug fährt um acht Uhr ab...".to_string(),
            },
            dedup_hash: dedup_fingerprint(text),
        }
    }

    fn candidates(n: usize, chunk_index: u32) -> Vec<CandidateQuestion> {
        (0..n)
            .map(|i| candidate(&format!("Frage Nummer {} für Chunk {}?", i, chunk_index), chunk_index))
            .collect()
    }

    #[tokio::test]
    async fn test_video_roundtrip() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        let video = VideoRecord::new(
            "abc123".to_string(),
            "Deutsch lernen".to_string(),
            "German".to_string(),
            "Der Zug fährt ab. Wir steigen ein.".to_string(),
        );
        store.upsert_video(&video).await.unwrap();

        let fetched = store.get_video("abc123").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Deutsch lernen");
        assert_eq!(fetched.transcript, video.transcript);
        assert!(fetched.has_transcript());

        assert!(store.get_video("missing").await.unwrap().is_none());

        let videos = store.list_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].question_count, 0);
    }

    #[tokio::test]
    async fn test_insert_assigns_contiguous_ordinals_under_cap() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        let inserted = store
            .insert_questions("v1", &candidates(6, 0), "test", 5)
            .await
            .unwrap();
        assert_eq!(inserted, 5);

        let questions = store.questions_for_video("v1").await.unwrap();
        assert_eq!(questions.len(), 5);
        let ordinals: Vec<u32> = questions.iter().map(|q| q.ordinal_index).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);

        // Round-trip keeps all structured fields.
        assert_eq!(questions[0].correct_answer, OptionLabel::C);
        assert_eq!(questions[0].options[2].text, "das");
        assert_eq!(questions[0].question_type, QuestionType::Grammar);
        assert_eq!(questions[0].generator_tag, "test");

        // A full store accepts nothing more.
        let inserted = store
            .insert_questions("v1", &candidates(3, 1), "test", 5)
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(store.question_count("v1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_overshooting_round_is_trimmed_to_room() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        store
            .insert_questions("v1", &candidates(12, 0), "test", 15)
            .await
            .unwrap();

        // Two rounds of 5 against room for 3: only 3 land in total.
        let first = store
            .insert_questions("v1", &candidates(5, 1), "test", 15)
            .await
            .unwrap();
        let second = store
            .insert_questions("v1", &candidates(5, 2), "test", 15)
            .await
            .unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert_eq!(store.question_count("v1").await.unwrap(), 15);

        let ordinals: Vec<u32> = store
            .questions_for_video("v1")
            .await
            .unwrap()
            .iter()
            .map(|q| q.ordinal_index)
            .collect();
        assert_eq!(ordinals, (0..15).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_counts_by_chunk_and_texts() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        let mut batch = candidates(2, 0);
        batch.extend(candidates(3, 2));
        store
            .insert_questions("v1", &batch, "test", 15)
            .await
            .unwrap();

        let counts = store.counts_by_chunk("v1").await.unwrap();
        assert_eq!(
            counts,
            vec![
                ChunkCount {
                    chunk_index: 0,
                    question_count: 2
                },
                ChunkCount {
                    chunk_index: 2,
                    question_count: 3
                },
            ]
        );

        let texts = store.question_texts("v1").await.unwrap();
        assert_eq!(texts.len(), 5);
        assert!(texts[0].contains("Chunk 0"));
        assert!(texts[4].contains("Chunk 2"));
    }

    #[tokio::test]
    async fn test_duplicate_groups_by_fingerprint() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        let batch = vec![
            candidate("Was bedeutet Haus?", 0),
            candidate("Was bedeutet \"Haus\"!?", 1),
            candidate("Etwas ganz anderes?", 2),
        ];
        store
            .insert_questions("v1", &batch, "test", 15)
            .await
            .unwrap();

        let groups = store.duplicate_groups("v1").await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].questions.len(), 2);
        assert!(groups[0].questions[0].contains("Haus"));
    }

    #[tokio::test]
    async fn test_delete_questions_clears_video() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        store
            .insert_questions("v1", &candidates(4, 0), "test", 15)
            .await
            .unwrap();
        let deleted = store.delete_questions("v1").await.unwrap();
        assert_eq!(deleted, 4);
        assert_eq!(store.question_count("v1").await.unwrap(), 0);

        // Ordinals restart from zero after a reset.
        store
            .insert_questions("v1", &candidates(2, 0), "test", 15)
            .await
            .unwrap();
        let questions = store.questions_for_video("v1").await.unwrap();
        assert_eq!(questions[0].ordinal_index, 0);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_until_released() {
        let store = SqliteQuestionStore::in_memory().unwrap();
        let window = Duration::from_secs(600);

        assert!(store.claim_generation("v1", window).await.unwrap());
        assert!(!store.claim_generation("v1", window).await.unwrap());

        // A different video has its own slot.
        assert!(store.claim_generation("v2", window).await.unwrap());

        store.release_generation("v1").await.unwrap();
        assert!(store.claim_generation("v1", window).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_claim_can_be_taken_over() {
        let store = SqliteQuestionStore::in_memory().unwrap();

        assert!(store
            .claim_generation("v1", Duration::from_secs(600))
            .await
            .unwrap());

        // With a zero staleness window the previous claim is already stale.
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store
            .claim_generation("v1", Duration::ZERO)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("questions.db");

        {
            let store = SqliteQuestionStore::new(&path).unwrap();
            store
                .insert_questions("v1", &candidates(2, 0), "test", 15)
                .await
                .unwrap();
        }

        let store = SqliteQuestionStore::new(&path).unwrap();
        assert_eq!(store.question_count("v1").await.unwrap(), 2);
        assert_eq!(
            store.questions_for_video("v1").await.unwrap()[0].ordinal_index,
            0
        );
    }
}
