//! Differential encoding context and the per-model encode/decode entry
//! points.

use super::similarity::weighted_similarity;
use super::sparse::{apply_sparse, encode_sparse, SparseDelta};
use super::quantized::{dequantize, quantize, QuantizedDelta};
use crate::config::DiffConfig;
use crate::error::LefResult;
use crate::format::LayerKind;

/// Resolved knobs for one encoding pass, derived either directly from
/// [`DiffConfig`] or from an `optimization_level` 1-5 spanning five
/// optimization levels that trade size against fidelity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffContext {
    pub similarity_threshold: f32,
    pub sparsity_threshold: f32,
    pub enable_sparse_diff: bool,
    pub enable_quantization: bool,
    pub quantization_bits: u8,
}

impl DiffContext {
    /// Map a 1-5 optimization level onto concrete parameters. Level 1 is
    /// conservative (only truly identical layers are skipped, deltas stored
    /// dense); level 5 is maximally aggressive (skips anything close, stores
    /// sparse and 4-bit quantized).
    pub fn optimization_level_to_params(level: u8, sparsity_threshold: f32) -> Self {
        let (similarity_threshold, enable_sparse_diff, enable_quantization, quantization_bits) =
            match level {
                1 => (0.95, false, false, 16),
                2 => (0.90, true, false, 16),
                3 => (0.85, true, true, 8),
                4 => (0.80, true, true, 6),
                _ => (0.75, true, true, 4),
            };
        Self {
            similarity_threshold,
            sparsity_threshold,
            enable_sparse_diff,
            enable_quantization,
            quantization_bits,
        }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        match config.optimization_level {
            Some(level) => Self::optimization_level_to_params(level, config.sparsity_threshold),
            None => Self {
                similarity_threshold: 0.99,
                sparsity_threshold: config.sparsity_threshold,
                enable_sparse_diff: true,
                enable_quantization: config.quantization_bits < 32,
                quantization_bits: config.quantization_bits,
            },
        }
    }
}

/// The result of encoding one layer's delta against its base counterpart.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerDiff {
    /// Similarity cleared the threshold; nothing is stored for this layer.
    Skipped,
    Dense(Vec<f32>),
    Sparse(SparseDelta),
    Quantized(QuantizedDelta),
    /// Sparse indices plus a quantized encoding of the kept values: sparse
    /// and quantization combined, used by the more aggressive optimization levels.
    SparseQuantized { len: usize, indices: Vec<u32>, quantized: QuantizedDelta },
}

/// Running totals across a whole-model diff pass.
#[derive(Debug, Clone, Default)]
pub struct DiffStats {
    pub layers_considered: usize,
    pub layers_skipped_similar: usize,
    pub layers_diffed: usize,
    pub dense_floats_stored: usize,
    pub sparse_entries_stored: usize,
}

impl DiffStats {
    pub fn record(&mut self, diff: &LayerDiff) {
        self.layers_considered += 1;
        match diff {
            LayerDiff::Skipped => self.layers_skipped_similar += 1,
            LayerDiff::Dense(v) => {
                self.layers_diffed += 1;
                self.dense_floats_stored += v.len();
            }
            LayerDiff::Sparse(s) => {
                self.layers_diffed += 1;
                self.sparse_entries_stored += s.indices.len();
            }
            LayerDiff::Quantized(q) => {
                self.layers_diffed += 1;
                self.sparse_entries_stored += q.codes.len();
            }
            LayerDiff::SparseQuantized { indices, .. } => {
                self.layers_diffed += 1;
                self.sparse_entries_stored += indices.len();
            }
        }
    }
}

/// On-disk byte size of a dense delta: `len` raw `f32` values.
fn dense_diff_size(len: usize) -> usize {
    len * 4
}

/// On-disk byte size of a sparse delta: an 8-byte header
/// (`significant_count`, `total_elements`, both `u32`) plus one `u32` index
/// and one `f32` value per kept entry.
fn sparse_diff_size(sparse: &SparseDelta) -> usize {
    8 + sparse.indices.len() * 8
}

/// On-disk byte size of a quantized delta: a 13-byte header (`scale: f32`,
/// `lo: f32`, `bits: u8`, `count: u32`) plus one packed code per element,
/// 1 byte when `bits <= 8` else 2.
fn quantized_diff_size(q: &QuantizedDelta) -> usize {
    let bytes_per_code = if q.bits <= 8 { 1 } else { 2 };
    13 + q.codes.len() * bytes_per_code
}

/// On-disk byte size of a sparse-plus-quantized delta: sparse indices
/// (`u32` each, no raw values) followed by a quantized encoding of the kept
/// values.
fn sparse_quantized_diff_size(index_count: usize, q: &QuantizedDelta) -> usize {
    4 + index_count * 4 + quantized_diff_size(q)
}

enum Candidate {
    Dense,
    Sparse,
    SparseQuantized,
    Quantized,
}

/// Encode one layer's delta against its base counterpart, gated by cosine
/// similarity and shaped by `ctx`. Among whichever encodings `ctx` enables,
/// the smallest on-disk representation wins; a dense delta is always a
/// candidate so an encoding that fails to shrink the layer (or that a
/// disabled quantizer can't produce, e.g. a zero-span delta) falls back to
/// it rather than being stored anyway.
pub fn encode_layer_diff(
    base: &[f32],
    new: &[f32],
    kind: LayerKind,
    ctx: &DiffContext,
) -> LefResult<LayerDiff> {
    let similarity = weighted_similarity(base, new, kind);
    if similarity >= ctx.similarity_threshold {
        return Ok(LayerDiff::Skipped);
    }

    let deltas: Vec<f32> = base.iter().zip(new.iter()).map(|(b, n)| n - b).collect();
    let mut winner = Candidate::Dense;
    let mut best_size = dense_diff_size(deltas.len());

    let mut sparse_opt: Option<SparseDelta> = None;
    let mut sparse_quantized_opt: Option<QuantizedDelta> = None;
    let mut quantized_opt: Option<QuantizedDelta> = None;

    if ctx.enable_sparse_diff {
        let sparse = encode_sparse(base, new, ctx.sparsity_threshold);
        let sparse_size = sparse_diff_size(&sparse);
        if sparse_size < best_size {
            best_size = sparse_size;
            winner = Candidate::Sparse;
        }
        if ctx.enable_quantization {
            if let Ok(q) = quantize(&sparse.values, ctx.quantization_bits) {
                let size = sparse_quantized_diff_size(sparse.indices.len(), &q);
                if size < best_size {
                    best_size = size;
                    winner = Candidate::SparseQuantized;
                }
                sparse_quantized_opt = Some(q);
            }
        }
        sparse_opt = Some(sparse);
    } else if ctx.enable_quantization {
        if let Ok(q) = quantize(&deltas, ctx.quantization_bits) {
            let size = quantized_diff_size(&q);
            if size < best_size {
                winner = Candidate::Quantized;
            }
            quantized_opt = Some(q);
        }
    }

    Ok(match winner {
        Candidate::Dense => LayerDiff::Dense(deltas),
        Candidate::Sparse => LayerDiff::Sparse(sparse_opt.expect("sparse candidate was scored")),
        Candidate::SparseQuantized => {
            let sparse = sparse_opt.expect("sparse candidate was scored");
            LayerDiff::SparseQuantized {
                len: sparse.len,
                indices: sparse.indices,
                quantized: sparse_quantized_opt.expect("sparse-quantized candidate was scored"),
            }
        }
        Candidate::Quantized => {
            LayerDiff::Quantized(quantized_opt.expect("quantized candidate was scored"))
        }
    })
}

/// Reconstruct `new` from `base` and a previously encoded diff.
pub fn apply_layer_diff(base: &[f32], diff: &LayerDiff) -> Vec<f32> {
    match diff {
        LayerDiff::Skipped => base.to_vec(),
        LayerDiff::Dense(deltas) => base.iter().zip(deltas.iter()).map(|(b, d)| b + d).collect(),
        LayerDiff::Sparse(sparse) => apply_sparse(base, sparse),
        LayerDiff::Quantized(q) => {
            let deltas = dequantize(q);
            base.iter().zip(deltas.iter()).map(|(b, d)| b + d).collect()
        }
        LayerDiff::SparseQuantized { len, indices, quantized } => {
            let values = dequantize(quantized);
            let sparse = SparseDelta {
                len: *len,
                indices: indices.clone(),
                values,
            };
            apply_sparse(base, &sparse)
        }
    }
}
