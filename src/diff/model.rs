//! Whole-model differential encoding: apply [`encode_layer_diff`]
//! across every layer two models share, and fold the per-layer results into
//! one [`DiffStats`] summary.

use super::context::{apply_layer_diff, encode_layer_diff, DiffContext, DiffStats, LayerDiff};
use crate::error::{LefError, LefResult};
use crate::io_ext::bytes_to_f32;
use crate::loader::Model;
use std::collections::HashMap;

/// Per-layer diffs between a base model and a derived ("speaker") model,
/// plus the aggregate stats recorded while producing them.
#[derive(Debug, Clone, Default)]
pub struct ModelDiffResult {
    pub diffs: HashMap<u16, LayerDiff>,
    pub stats: DiffStats,
}

/// Diff every layer `speaker` shares with `base`. Both models must declare
/// the same layer count; a layer id present in one but not the other is an
/// error rather than a silent skip, since the codec has no way to represent
/// "this layer doesn't exist on the other side".
pub fn diff_models(base: &Model, speaker: &Model, ctx: &DiffContext) -> LefResult<ModelDiffResult> {
    if base.meta.num_layers != speaker.meta.num_layers {
        return Err(LefError::InvalidArgument(format!(
            "base model has {} layers, speaker model has {}",
            base.meta.num_layers, speaker.meta.num_layers
        )));
    }

    let mut result = ModelDiffResult::default();
    let mut layer_ids: Vec<u16> = base.layer_headers.keys().copied().collect();
    layer_ids.sort_unstable();

    for layer_id in layer_ids {
        let base_header = base.layer_by_id(layer_id)?;
        let speaker_header = speaker.layer_by_id(layer_id)?;

        let base_values = bytes_to_f32(&base.decoded_layer_bytes(layer_id)?);
        let speaker_values = bytes_to_f32(&speaker.decoded_layer_bytes(layer_id)?);
        if base_values.len() != speaker_values.len() {
            return Err(LefError::InvalidArgument(format!(
                "layer {layer_id} has {} base values but {} speaker values",
                base_values.len(),
                speaker_values.len()
            )));
        }
        let _ = speaker_header;

        let diff = encode_layer_diff(&base_values, &speaker_values, base_header.layer_kind, ctx)?;
        result.stats.record(&diff);
        result.diffs.insert(layer_id, diff);
    }

    Ok(result)
}

/// Reconstruct every speaker layer's values from `base` and a previously
/// computed [`ModelDiffResult`].
pub fn apply_model_diff(base: &Model, diffs: &HashMap<u16, LayerDiff>) -> LefResult<HashMap<u16, Vec<f32>>> {
    let mut out = HashMap::with_capacity(diffs.len());
    for (layer_id, diff) in diffs {
        let base_values = bytes_to_f32(&base.decoded_layer_bytes(*layer_id)?);
        out.insert(*layer_id, apply_layer_diff(&base_values, diff));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Header, LayerHeader, LayerIndexEntry, LayerKind, ModelMeta, QuantizationKind};
    use crate::io_ext::f32_to_bytes;
    use crate::loader::Backing;
    use std::sync::Arc;

    fn model_with_layer(layer_id: u16, values: &[f32]) -> Model {
        let bytes = f32_to_bytes(values);
        let layer_header = LayerHeader {
            layer_id,
            layer_kind: LayerKind::Linear,
            quantization_type: QuantizationKind::None,
            meta_size: 0,
            data_size: bytes.len() as u32,
            compressed_size: 0,
            data_offset: 0,
            checksum: 0,
        };
        let mut layer_headers = HashMap::new();
        layer_headers.insert(layer_id, layer_header);
        Model {
            header: Header::init(),
            meta: ModelMeta {
                name: "demo".to_string(),
                version: "1.0".to_string(),
                author: "lef".to_string(),
                description: String::new(),
                input_dim: 1,
                output_dim: 1,
                hidden_dim: 1,
                num_layers: 1,
                num_heads: 1,
                vocab_size: 1,
                sample_rate: 1,
                mel_channels: 1,
                hop_length: 1,
                win_length: 1,
                default_quantization: QuantizationKind::None,
                mixed_precision: false,
                quantization_params_size: 0,
            },
            layer_index: vec![LayerIndexEntry {
                layer_id,
                header_offset: 0,
                data_offset: 0,
                data_size: bytes.len() as u32,
            }],
            layer_headers,
            backing: Backing::Owned(Arc::new(bytes)),
        }
    }

    #[test]
    fn diffing_identical_models_skips_every_layer() {
        let base = model_with_layer(0, &[1.0, 2.0, 3.0, 4.0]);
        let speaker = model_with_layer(0, &[1.0, 2.0, 3.0, 4.0]);
        let ctx = DiffContext::optimization_level_to_params(3, 1e-4);
        let result = diff_models(&base, &speaker, &ctx).unwrap();
        assert_eq!(result.stats.layers_skipped_similar, 1);
        assert_eq!(result.stats.layers_diffed, 0);
    }

    #[test]
    fn diff_and_apply_round_trip_a_changed_layer() {
        let base = model_with_layer(0, &[1.0, 2.0, 3.0, 4.0]);
        let speaker = model_with_layer(0, &[1.0, 9.0, 3.0, -4.0]);
        let ctx = DiffContext::optimization_level_to_params(1, 1e-4);
        let result = diff_models(&base, &speaker, &ctx).unwrap();
        assert_eq!(result.stats.layers_diffed, 1);

        let reconstructed = apply_model_diff(&base, &result.diffs).unwrap();
        let values = &reconstructed[&0];
        for (a, b) in values.iter().zip([1.0, 9.0, 3.0, -4.0].iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn mismatched_layer_counts_are_rejected() {
        let base = model_with_layer(0, &[1.0, 2.0]);
        let mut speaker = model_with_layer(0, &[1.0, 2.0]);
        speaker.meta.num_layers = 2;
        let ctx = DiffContext::optimization_level_to_params(3, 1e-4);
        assert!(diff_models(&base, &speaker, &ctx).is_err());
    }
}
