use crate::models::{Chunk, RankOptions};

/// Fuses dense and sparse score vectors into `(corpus index, score)` pairs.
///
/// Each signal is scaled by its own maximum, then weighted and summed. The
/// file filter zeroes other sources after that scaling, so filtering never
/// changes the scores of the chunks it keeps. Ties keep corpus order and
/// non-positive scores are dropped.
#[must_use]
pub fn fuse_scores(
    dense: &[f32],
    sparse: &[f32],
    chunks: &[Chunk],
    options: &RankOptions,
) -> Vec<(usize, f32)> {
    debug_assert_eq!(dense.len(), chunks.len());
    debug_assert_eq!(sparse.len(), chunks.len());
    if options.top_k == 0 || chunks.is_empty() {
        return Vec::new();
    }

    let dense = normalize_by_max(dense);
    let sparse = normalize_by_max(sparse);

    let mut combined = chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            let matches_filter = options
                .file_filter
                .as_deref()
                .is_none_or(|filename| chunk.source_filename() == filename);
            let score = if matches_filter {
                let dense_score = dense.get(idx).copied().unwrap_or(0.0);
                let sparse_score = sparse.get(idx).copied().unwrap_or(0.0);
                options.semantic_weight * dense_score + options.keyword_weight * sparse_score
            } else {
                0.0
            };
            (idx, score)
        })
        .collect::<Vec<_>>();

    // `sort_by` is stable, so equal scores stay in insertion order.
    combined.sort_by(|a, b| b.1.total_cmp(&a.1));
    combined.truncate(options.top_k);
    combined.retain(|(_, score)| *score > 0.0);
    combined
}

/// Divides by the maximum when it is positive; otherwise returns zeros.
#[must_use]
pub fn normalize_by_max(scores: &[f32]) -> Vec<f32> {
    let max = scores
        .iter()
        .copied()
        .filter(|score| score.is_finite())
        .fold(0.0f32, f32::max);
    if max > 0.0 {
        scores
            .iter()
            .map(|score| if score.is_finite() { score / max } else { 0.0 })
            .collect()
    } else {
        vec![0.0; scores.len()]
    }
}
