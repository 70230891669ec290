/// Cosine similarity. Zero vectors are similar to nothing.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Maximal marginal relevance selection.
///
/// Returns up to `top_n` `(candidate index, similarity to document)` pairs in pick order.
/// The first pick is the candidate closest to the document; every later pick maximises
/// `(1 - diversity) * sim(doc) - diversity * max sim(already picked)`. Ties go to the
/// earlier candidate.
pub(crate) fn mmr_select(
    document: &[f32],
    candidates: &[Vec<f32>],
    top_n: usize,
    diversity: f32,
) -> Vec<(usize, f32)> {
    if candidates.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let doc_sims: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(c, document))
        .collect();

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(top_n.min(candidates.len()));

    while selected.len() < top_n && !remaining.is_empty() {
        let mut best: Option<(usize, f32)> = None;

        for (pos, &idx) in remaining.iter().enumerate() {
            let score = if selected.is_empty() {
                doc_sims[idx]
            } else {
                let redundancy = selected
                    .iter()
                    .map(|&s| cosine_similarity(&candidates[idx], &candidates[s]))
                    .fold(f32::NEG_INFINITY, f32::max);
                (1.0 - diversity) * doc_sims[idx] - diversity * redundancy
            };

            let better = match best {
                Some((_, top)) => score > top,
                None => true,
            };
            if better {
                best = Some((pos, score));
            }
        }

        let Some((pos, _)) = best else {
            break;
        };
        selected.push(remaining.remove(pos));
    }

    selected.into_iter().map(|i| (i, doc_sims[i])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    fn fixture() -> (Vec<f32>, Vec<Vec<f32>>) {
        let doc = vec![1.0, 0.0, 0.0];
        let candidates = vec![
            vec![0.9, 0.1, 0.0], // close to the document
            vec![0.89, 0.11, 0.0], // near-duplicate of the first
            vec![0.6, 0.0, 0.8], // less relevant, different direction
        ];
        (doc, candidates)
    }

    #[test]
    fn zero_diversity_ranks_by_relevance() {
        let (doc, candidates) = fixture();
        let picks: Vec<usize> = mmr_select(&doc, &candidates, 3, 0.0)
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        assert_eq!(picks, vec![0, 1, 2]);
    }

    #[test]
    fn high_diversity_skips_near_duplicates() {
        let (doc, candidates) = fixture();
        let picks: Vec<usize> = mmr_select(&doc, &candidates, 2, 0.7)
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        assert_eq!(picks, vec![0, 2]);
    }

    #[test]
    fn scores_are_document_similarities() {
        let (doc, candidates) = fixture();
        for (i, sim) in mmr_select(&doc, &candidates, 3, 0.5) {
            assert!((sim - cosine_similarity(&candidates[i], &doc)).abs() < 1e-6);
        }
    }

    #[test]
    fn top_n_caps_the_selection() {
        let (doc, candidates) = fixture();
        assert_eq!(mmr_select(&doc, &candidates, 1, 0.7).len(), 1);
        assert_eq!(mmr_select(&doc, &candidates, 10, 0.7).len(), 3);
        assert!(mmr_select(&doc, &[], 5, 0.7).is_empty());
    }
}
