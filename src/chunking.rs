//! Deterministic transcript chunking.
//!
//! Splits a transcript into bounded, overlapping text windows along sentence
//! boundaries. Chunks are derived, never persisted: questions reference them
//! by index, so for a fixed `(text, max_chunk_chars, overlap_chars)` the
//! output must always be identical.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::OnceLock;

/// A bounded window of transcript text with positional metadata.
///
/// `start_offset..end_offset` is the chunk's *primary* byte range: the
/// sentences that are new in this chunk. `text` additionally carries a short
/// lead-in from the end of the previous chunk for context continuity, so
/// concatenating `text` across chunks duplicates the overlap, while
/// concatenating the primary ranges reconstructs the transcript exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// 0-based chunk index.
    pub index: usize,
    /// Total number of chunks produced from the transcript.
    pub total_chunks: usize,
    /// Byte offset where this chunk's primary range starts.
    pub start_offset: usize,
    /// Byte offset where this chunk's primary range ends (exclusive).
    pub end_offset: usize,
    /// Chunk text sent to the generator: overlap lead-in plus primary
    /// sentences, trimmed.
    pub text: String,
    /// Half-open range of primary sentence indices.
    pub sentence_range: (usize, usize),
}

impl TranscriptChunk {
    /// Where this chunk sits relative to the whole transcript.
    pub fn placement(&self) -> ChunkPlacement {
        if self.index == 0 {
            ChunkPlacement::Beginning
        } else if self.index + 1 == self.total_chunks {
            ChunkPlacement::End
        } else {
            ChunkPlacement::Middle
        }
    }

    /// Positional description, e.g. "Part 2 of 5".
    pub fn part_label(&self) -> String {
        format!("Part {} of {}", self.index + 1, self.total_chunks)
    }

    /// First `max_chars` characters of the chunk text, with an ellipsis when
    /// truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            self.text.clone()
        } else {
            let cut: String = self.text.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }
}

/// Coarse position of a chunk within the transcript, used in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlacement {
    Beginning,
    Middle,
    End,
}

impl std::fmt::Display for ChunkPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkPlacement::Beginning => write!(f, "the beginning"),
            ChunkPlacement::Middle => write!(f, "the middle"),
            ChunkPlacement::End => write!(f, "the end"),
        }
    }
}

/// Matches one sentence: any run of text up to and including its terminal
/// punctuation (consecutive marks stay attached), or a trailing run with no
/// terminal mark. Every byte of the input lands in exactly one match.
fn sentence_regex() -> &'static Regex {
    static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
    SENTENCE_RE.get_or_init(|| {
        Regex::new(r"[^.!?]*[.!?]+|[^.!?]+$").expect("sentence regex is valid")
    })
}

/// Split text into sentence byte ranges covering the whole input.
///
/// A transcript with no terminal punctuation is a single sentence.
fn split_sentences(text: &str) -> Vec<Range<usize>> {
    sentence_regex()
        .find_iter(text)
        .map(|m| m.start()..m.end())
        .collect()
}

/// Split a transcript into overlapping, bounded-size chunks.
///
/// Sentences accumulate greedily by character count; when the next sentence
/// would push the buffer past `max_chunk_chars`, the chunk closes and the
/// next one is seeded with up to the last 2 sentences of the prior chunk,
/// taking only as many (newest first) as fit within `overlap_chars`. A
/// single sentence longer than `max_chunk_chars` becomes its own oversized
/// chunk; sentences are never split.
pub fn chunk_transcript(
    text: &str,
    max_chunk_chars: usize,
    overlap_chars: usize,
) -> Vec<TranscriptChunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let sentences = split_sentences(text);
    let char_counts: Vec<usize> = sentences
        .iter()
        .map(|r| text[r.clone()].chars().count())
        .collect();

    // Primary sentence spans per chunk, plus the byte offset where each
    // chunk's text (including any overlap lead-in) begins.
    struct RawChunk {
        first_sentence: usize,
        end_sentence: usize,
        text_start: usize,
    }

    let mut raw: Vec<RawChunk> = Vec::new();
    let mut first = 0usize;
    let mut text_start = sentences[0].start;
    let mut buffered_chars = 0usize;

    for i in 0..sentences.len() {
        let added = char_counts[i];
        if i > first && buffered_chars + added > max_chunk_chars {
            raw.push(RawChunk {
                first_sentence: first,
                end_sentence: i,
                text_start,
            });

            // Seed the next buffer with the tail of the chunk just closed.
            let (overlap_first, overlap_len) =
                overlap_tail(&char_counts, first, i, overlap_chars);
            text_start = match overlap_first {
                Some(j) => sentences[j].start,
                None => sentences[i].start,
            };
            first = i;
            buffered_chars = overlap_len;
        }
        buffered_chars += added;
    }

    raw.push(RawChunk {
        first_sentence: first,
        end_sentence: sentences.len(),
        text_start,
    });

    let total = raw.len();
    raw.into_iter()
        .enumerate()
        .map(|(index, c)| {
            let start_offset = sentences[c.first_sentence].start;
            let end_offset = sentences[c.end_sentence - 1].end;
            TranscriptChunk {
                index,
                total_chunks: total,
                start_offset,
                end_offset,
                text: text[c.text_start..end_offset].trim().to_string(),
                sentence_range: (c.first_sentence, c.end_sentence),
            }
        })
        .collect()
}

/// Pick the overlap seed for the chunk starting at sentence `next`: up to the
/// last 2 primary sentences of the chunk `[prior_first, next)`, newest first,
/// as long as their combined length stays within `overlap_chars`. Returns the
/// first seeded sentence index and the seed's character length.
fn overlap_tail(
    char_counts: &[usize],
    prior_first: usize,
    next: usize,
    overlap_chars: usize,
) -> (Option<usize>, usize) {
    let mut overlap_first = None;
    let mut overlap_len = 0usize;

    for back in 1..=2 {
        if next < back {
            break;
        }
        let j = next - back;
        if j < prior_first || overlap_len + char_counts[j] > overlap_chars {
            break;
        }
        overlap_len += char_counts[j];
        overlap_first = Some(j);
    }

    (overlap_first, overlap_len)
}
