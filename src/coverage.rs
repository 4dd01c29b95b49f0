//! Coverage analysis: which chunks of a transcript are under-assessed.
//!
//! Works entirely on derived state. Counts come from the question store's
//! per-chunk aggregation; nothing here is persisted.

use crate::store::ChunkCount;

/// How many leading chunks to target when ranking yields nothing.
pub const COLD_START_CHUNKS: usize = 3;

/// A chunk with fewer questions than the per-chunk target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkNeed {
    pub chunk_index: usize,
    pub current_count: u32,
    pub deficit: u32,
}

/// Per-chunk question target: the cap spread evenly across chunks, rounded
/// up. The target stays derived from the fixed cap regardless of transcript
/// length, so long transcripts get a lower per-chunk target rather than more
/// questions overall.
pub fn target_per_chunk(cap: u32, total_chunks: usize) -> u32 {
    if total_chunks == 0 {
        return cap;
    }
    cap.div_ceil(total_chunks as u32)
}

/// Rank chunks by need: every chunk below the per-chunk target, least
/// covered first, ties broken by lower chunk index.
pub fn rank_chunks(total_chunks: usize, existing: &[ChunkCount], cap: u32) -> Vec<ChunkNeed> {
    let target = target_per_chunk(cap, total_chunks);

    let mut counts = vec![0u32; total_chunks];
    for c in existing {
        let idx = c.chunk_index as usize;
        if idx < total_chunks {
            counts[idx] = c.question_count;
        }
    }

    let mut needs: Vec<ChunkNeed> = counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count < target)
        .map(|(chunk_index, &current_count)| ChunkNeed {
            chunk_index,
            current_count,
            deficit: target - current_count,
        })
        .collect();
    needs.sort_by_key(|n| (n.current_count, n.chunk_index));
    needs
}

/// Fallback targets for a transcript with no ranked needs: the first
/// `min(3, total_chunks)` chunk indices.
pub fn cold_start_chunks(total_chunks: usize) -> Vec<usize> {
    (0..total_chunks.min(COLD_START_CHUNKS)).collect()
}

/// Pick the chunks for one generation round: the most needy
/// `ceil(desired_count / 2)` chunks, or the cold-start set when ranking
/// turns up nothing.
pub fn select_chunks(
    total_chunks: usize,
    existing: &[ChunkCount],
    cap: u32,
    desired_count: u32,
) -> Vec<usize> {
    let width = (desired_count as usize).div_ceil(2).max(1);
    let selected: Vec<usize> = rank_chunks(total_chunks, existing, cap)
        .into_iter()
        .take(width)
        .map(|n| n.chunk_index)
        .collect();

    if selected.is_empty() {
        cold_start_chunks(total_chunks)
    } else {
        selected
    }
}

/// Human-readable verdict on the current distribution, shown by the
/// analytics endpoint. Chunks sitting below 70% of the average count are
/// called out with 1-based indices.
pub fn recommendation(coverage: &[ChunkCount]) -> String {
    if coverage.is_empty() {
        return "No questions generated yet. Generate initial questions.".to_string();
    }

    let total: u32 = coverage.iter().map(|c| c.question_count).sum();
    let avg = f64::from(total) / coverage.len() as f64;
    let underrepresented: Vec<String> = coverage
        .iter()
        .filter(|c| f64::from(c.question_count) < avg * 0.7)
        .map(|c| (c.chunk_index + 1).to_string())
        .collect();

    if underrepresented.is_empty() {
        "Good chunk coverage. Consider reviewing for quality and diversity.".to_string()
    } else {
        format!(
            "Generate more questions for chunks: {}",
            underrepresented.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(u32, u32)]) -> Vec<ChunkCount> {
        pairs
            .iter()
            .map(|&(chunk_index, question_count)| ChunkCount {
                chunk_index,
                question_count,
            })
            .collect()
    }

    #[test]
    fn test_target_per_chunk_rounds_up() {
        assert_eq!(target_per_chunk(15, 4), 4);
        assert_eq!(target_per_chunk(15, 5), 3);
        assert_eq!(target_per_chunk(15, 15), 1);
        assert_eq!(target_per_chunk(15, 40), 1);
        assert_eq!(target_per_chunk(15, 1), 15);
        assert_eq!(target_per_chunk(15, 0), 15);
    }

    #[test]
    fn test_rank_orders_least_covered_first() {
        // Counts per chunk: [2, 0, 5, 1], target 2 questions per chunk.
        let existing = counts(&[(0, 2), (2, 5), (3, 1)]);
        let needs = rank_chunks(4, &existing, 8);

        let order: Vec<usize> = needs.iter().map(|n| n.chunk_index).collect();
        assert_eq!(order, vec![1, 3]);
        assert_eq!(needs[0].current_count, 0);
        assert_eq!(needs[0].deficit, 2);
        assert_eq!(needs[1].deficit, 1);
    }

    #[test]
    fn test_rank_breaks_ties_by_lower_index() {
        let needs = rank_chunks(4, &[], 15);
        let order: Vec<usize> = needs.iter().map(|n| n.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(needs.iter().all(|n| n.deficit == 4));
    }

    #[test]
    fn test_rank_skips_chunks_at_target() {
        let existing = counts(&[(0, 4), (1, 4), (2, 4), (3, 4)]);
        assert!(rank_chunks(4, &existing, 15).is_empty());
    }

    #[test]
    fn test_cold_start_takes_leading_chunks() {
        assert_eq!(cold_start_chunks(10), vec![0, 1, 2]);
        assert_eq!(cold_start_chunks(2), vec![0, 1]);
        assert_eq!(cold_start_chunks(0), Vec::<usize>::new());
    }

    #[test]
    fn test_select_takes_half_the_desired_count() {
        // 5 questions wanted -> 3 chunks, the 3 neediest.
        let existing = counts(&[(0, 3), (1, 1), (2, 0), (3, 2)]);
        let selected = select_chunks(4, &existing, 15, 5);
        assert_eq!(selected, vec![2, 1, 3]);
    }

    #[test]
    fn test_select_falls_back_to_cold_start() {
        let existing = counts(&[(0, 4), (1, 4), (2, 4), (3, 4)]);
        let selected = select_chunks(4, &existing, 15, 5);
        assert_eq!(selected, vec![0, 1, 2]);
    }

    #[test]
    fn test_recommendation_messages() {
        assert_eq!(
            recommendation(&[]),
            "No questions generated yet. Generate initial questions."
        );

        let balanced = counts(&[(0, 3), (1, 3), (2, 3)]);
        assert_eq!(
            recommendation(&balanced),
            "Good chunk coverage. Consider reviewing for quality and diversity."
        );

        // Average 3.0; chunks below 2.1 questions get flagged, 1-based.
        let skewed = counts(&[(0, 5), (1, 1), (2, 4), (3, 2)]);
        assert_eq!(
            recommendation(&skewed),
            "Generate more questions for chunks: 2, 4"
        );
    }
}
