//! Question domain model.
//!
//! A question is an append-only record owned by a video: once persisted it is
//! never updated in place. The set grows through generation and shrinks only
//! via the full reset path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Option label for multiple-choice answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels, in presentation order.
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    /// Parse a label, tolerating whitespace and lowercase.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One labeled answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: OptionLabel,
    pub text: String,
}

/// Pedagogical category of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Comprehension,
    Vocabulary,
    Grammar,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Comprehension => "comprehension",
            QuestionType::Vocabulary => "vocabulary",
            QuestionType::Grammar => "grammar",
        }
    }

    /// Parse a type name, falling back to comprehension for anything unknown.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vocabulary" => QuestionType::Vocabulary,
            "grammar" => QuestionType::Grammar,
            _ => QuestionType::Comprehension,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty grade of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parse a difficulty name, falling back to medium for anything unknown.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance of a question: which chunk of the transcript it was grounded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkTag {
    /// Index of the source chunk.
    pub chunk_index: u32,
    /// Total chunks the transcript had when this question was generated.
    pub chunk_total: u32,
    /// Byte offset of the chunk's primary range in the transcript.
    pub chunk_position: u32,
    /// First ~100 characters of the chunk text.
    pub chunk_text_preview: String,
}

/// A validated question that has not been persisted yet.
///
/// Produced by the generation pipeline; the persistence gate assigns the
/// ordinal index when it commits the candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQuestion {
    pub question: String,
    pub options: [AnswerOption; 4],
    pub correct_answer: OptionLabel,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub explanation: String,
    pub chunk: ChunkTag,
    pub dedup_hash: String,
}

/// A persisted question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub video_id: String,
    /// 0-based position within the video's question list; unique and
    /// contiguous per video.
    pub ordinal_index: u32,
    pub question: String,
    pub options: [AnswerOption; 4],
    pub correct_answer: OptionLabel,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub explanation: String,
    pub chunk: ChunkTag,
    pub dedup_hash: String,
    /// Which generation path produced this question.
    pub generator_tag: String,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Build a persisted question from a candidate at a given ordinal.
    pub fn from_candidate(
        video_id: &str,
        ordinal_index: u32,
        candidate: CandidateQuestion,
        generator_tag: &str,
    ) -> Self {
        Self {
            video_id: video_id.to_string(),
            ordinal_index,
            question: candidate.question,
            options: candidate.options,
            correct_answer: candidate.correct_answer,
            question_type: candidate.question_type,
            difficulty: candidate.difficulty,
            explanation: candidate.explanation,
            chunk: candidate.chunk,
            dedup_hash: candidate.dedup_hash,
            generator_tag: generator_tag.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Normalized-text fingerprint used to spot likely duplicate questions.
///
/// Lowercases and strips everything but alphanumerics before hashing, so
/// rephrasings that differ only in punctuation or spacing collide.
pub fn dedup_fingerprint(question: &str) -> String {
    let normalized: String = question
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_label_parse() {
        assert_eq!(OptionLabel::parse("A"), Some(OptionLabel::A));
        assert_eq!(OptionLabel::parse(" b "), Some(OptionLabel::B));
        assert_eq!(OptionLabel::parse("d"), Some(OptionLabel::D));
        assert_eq!(OptionLabel::parse("E"), None);
        assert_eq!(OptionLabel::parse(""), None);
    }

    #[test]
    fn test_type_and_difficulty_lossy_parse() {
        assert_eq!(QuestionType::parse_lossy("Vocabulary"), QuestionType::Vocabulary);
        assert_eq!(QuestionType::parse_lossy("unknown"), QuestionType::Comprehension);
        assert_eq!(Difficulty::parse_lossy("HARD"), Difficulty::Hard);
        assert_eq!(Difficulty::parse_lossy(""), Difficulty::Medium);
    }

    #[test]
    fn test_dedup_fingerprint_ignores_punctuation_and_case() {
        let a = dedup_fingerprint("Was bedeutet das Wort \"Haus\"?");
        let b = dedup_fingerprint("was bedeutet das wort Haus");
        assert_eq!(a, b);

        let c = dedup_fingerprint("Was bedeutet das Wort \"Auto\"?");
        assert_ne!(a, c);
    }

    #[test]
    fn test_dedup_fingerprint_keeps_umlauts() {
        let a = dedup_fingerprint("Wofür steht das?");
        let b = dedup_fingerprint("Wofur steht das?");
        assert_ne!(a, b);
    }
}
