//! Cosine similarity gating for the differential codec.
//!
//! A layer whose weighted similarity to its base counterpart clears the
//! configured threshold is skipped entirely rather than diffed: the
//! "differential skip" path. The weighting lets some layer kinds demand a
//! stricter match than others before a skip is trusted.

use crate::format::LayerKind;

/// Per-kind weight applied to the raw cosine similarity before it is
/// compared against a threshold. Attention layers are weighted up (small
/// drifts there are more perceptually significant); vocoder and embedding
/// layers are weighted down (tolerate more drift before diffing kicks in).
pub fn layer_kind_weight(kind: LayerKind) -> f32 {
    match kind {
        LayerKind::Embedding => 0.9,
        LayerKind::Attention => 1.1,
        LayerKind::Vocoder => 0.8,
        _ => 1.0,
    }
}

/// Plain cosine similarity in `[-1.0, 1.0]`. Returns `0.0` for a zero-length
/// or zero-magnitude input pair, treating "nothing to compare" as "no
/// similarity" rather than propagating NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += (*x as f64) * (*y as f64);
        norm_a += (*x as f64) * (*x as f64);
        norm_b += (*y as f64) * (*y as f64);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Cosine similarity remapped from `[-1.0, 1.0]` to `[0.0, 1.0]` via
/// `(sim + 1) / 2`, then scaled by the layer kind's weight and clamped back
/// into `[0.0, 1.0]` so a weight > 1.0 can't push the score out of range.
/// Thresholds (e.g. the optimization-level table) live in this `[0,1]`
/// space, not raw cosine space.
pub fn weighted_similarity(base: &[f32], new: &[f32], kind: LayerKind) -> f32 {
    let normalized = (cosine_similarity(base, new) + 1.0) / 2.0;
    (normalized * layer_kind_weight(kind)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_fully_similar() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_zero_similarity() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_are_maximally_dissimilar() {
        let a = vec![1.0, 1.0];
        let b = vec![-1.0, -1.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_yield_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn attention_weight_amplifies_normalized_similarity() {
        let v = vec![1.0, 1.0, 1.0];
        let w = vec![1.0, 1.0, 0.9];
        let normalized = (cosine_similarity(&v, &w) + 1.0) / 2.0;
        let weighted = weighted_similarity(&v, &w, LayerKind::Attention);
        assert!(weighted >= normalized);
    }

    #[test]
    fn vocoder_weight_dampens_normalized_similarity() {
        let v = vec![1.0, 1.0, 1.0];
        let w = vec![1.0, 1.0, 0.9];
        let normalized = (cosine_similarity(&v, &w) + 1.0) / 2.0;
        let weighted = weighted_similarity(&v, &w, LayerKind::Vocoder);
        assert!(weighted <= normalized);
    }

    #[test]
    fn identical_vectors_normalize_to_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((weighted_similarity(&v, &v, LayerKind::Linear) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_normalize_to_zero() {
        let a = vec![1.0, 1.0];
        let b = vec![-1.0, -1.0];
        assert!(weighted_similarity(&a, &b, LayerKind::Linear).abs() < 1e-6);
    }
}
