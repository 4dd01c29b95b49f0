//! Parsing and validation of generator output.
//!
//! Models are asked for a JSON array but routinely wrap it in prose or code
//! fences. The parser locates the outermost array, then validates each
//! candidate on its own: a malformed candidate is dropped, not the batch.

use crate::error::{FrageError, Result};
use crate::question::{AnswerOption, Difficulty, OptionLabel, QuestionType};
use serde::Deserialize;
use tracing::warn;

/// A structurally valid question, not yet tied to a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub question: String,
    /// Options in label order A through D.
    pub options: [AnswerOption; 4],
    pub correct_answer: OptionLabel,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub explanation: String,
}

/// Candidate fields as the model emits them, before validation.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<RawOption>,
    #[serde(default)]
    correct_answer: String,
    #[serde(default, rename = "type")]
    question_type: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    label: String,
    #[serde(default)]
    text: String,
}

/// Locate the outermost JSON array in possibly prose-wrapped output.
pub fn extract_json_array(raw: &str) -> Result<&str> {
    let start = raw
        .find('[')
        .ok_or_else(|| FrageError::ParseFailed("no JSON array in output".to_string()))?;
    let end = raw
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| FrageError::ParseFailed("unterminated JSON array in output".to_string()))?;
    Ok(&raw[start..=end])
}

/// Parse raw generator output into validated questions.
///
/// An unparsable payload is an error and the whole chunk yields nothing;
/// individually malformed candidates are dropped with a warning so one bad
/// entry cannot sink its siblings.
pub fn parse_questions(raw: &str) -> Result<Vec<ParsedQuestion>> {
    let payload = extract_json_array(raw)?;
    let candidates: Vec<RawCandidate> = serde_json::from_str(payload)
        .map_err(|e| FrageError::ParseFailed(format!("invalid JSON array: {}", e)))?;

    let mut valid = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.into_iter().enumerate() {
        match validate_candidate(candidate) {
            Ok(question) => valid.push(question),
            Err(reason) => warn!("Dropping malformed question candidate {}: {}", i, reason),
        }
    }
    Ok(valid)
}

fn validate_candidate(raw: RawCandidate) -> std::result::Result<ParsedQuestion, String> {
    let question = raw.question.trim().to_string();
    if question.is_empty() {
        return Err("empty question text".to_string());
    }

    if raw.options.len() != 4 {
        return Err(format!("expected 4 options, got {}", raw.options.len()));
    }

    let mut options = Vec::with_capacity(4);
    let mut seen = [false; 4];
    for raw_option in raw.options {
        let label = OptionLabel::parse(&raw_option.label)
            .ok_or_else(|| format!("unknown option label {:?}", raw_option.label))?;
        if seen[label as usize] {
            return Err(format!("duplicate option label {}", label));
        }
        seen[label as usize] = true;
        options.push(AnswerOption {
            label,
            text: raw_option.text,
        });
    }
    // Four options with distinct valid labels covers A through D; normalize
    // to label order.
    options.sort_by_key(|o| o.label);
    let options: [AnswerOption; 4] = options
        .try_into()
        .map_err(|_| "expected 4 options".to_string())?;

    let correct_answer = OptionLabel::parse(&raw.correct_answer)
        .ok_or_else(|| format!("unknown correct_answer {:?}", raw.correct_answer))?;

    Ok(ParsedQuestion {
        question,
        options,
        correct_answer,
        question_type: QuestionType::parse_lossy(&raw.question_type),
        difficulty: Difficulty::parse_lossy(&raw.difficulty),
        explanation: raw.explanation.trim().to_string(),
    })
}
