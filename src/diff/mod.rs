//! Differential weight-delta codec: similarity gating decides
//! whether a layer needs encoding at all; sparse indexing and uniform
//! quantization shrink what does.

pub mod context;
pub mod model;
pub mod quantized;
pub mod similarity;
pub mod sparse;

pub use context::{apply_layer_diff, encode_layer_diff, DiffContext, DiffStats, LayerDiff};
pub use model::{apply_model_diff, diff_models, ModelDiffResult};
pub use quantized::{dequantize, quantize, QuantizedDelta};
pub use similarity::{cosine_similarity, layer_kind_weight, weighted_similarity};
pub use sparse::{apply_sparse, decode_sparse, encode_sparse, SparseDelta};
