//! Applying and reversing an extension's layer blends against a base model.

use super::blend::blend_values;
use super::compatibility::check_compatibility;
use super::lefx::ExtensionModel;
use crate::error::{LefError, LefResult};
use crate::format::{BlendMode, DependencyType};
use crate::io_ext::bytes_to_f32;
use crate::loader::Model;
use std::collections::HashMap;

/// The effect of applying one extension: blended replacements for existing
/// base layers, brand-new additive layers, and a snapshot of every base
/// layer touched so the blend can be undone exactly: deactivation must be
/// correct even for `Add`/`Multiply`, which are not otherwise self-inverse.
pub struct ActivationState {
    pub blended: HashMap<u16, Vec<f32>>,
    pub additive: HashMap<u16, Vec<f32>>,
    pre_images: HashMap<u16, Vec<f32>>,
}

/// Apply every layer of `ext` against `base` at the given global weight
/// (combined with each layer's own `blend_weight`), after checking `ext` is
/// compatible with `base` and that every extension it `Required`-depends on
/// is present in `available`. Either check failing fails the whole apply
/// with no partial blends left behind: a compatibility mismatch surfaces as
/// `VERSION_INCOMPATIBLE`, a missing dependency as `INVALID_ARGUMENT`.
///
/// Layers below their `similarity_threshold` trigger no change are still
/// applied; the threshold in a [`crate::format::LefxLayerHeader`] gates the
/// differential codec, not activation. A base layer whose `data_size`
/// doesn't match the extension layer's is skipped rather than blended: the
/// two aren't broadcast-compatible and zipping them would silently produce
/// a wrong-length layer.
pub fn apply_extension(
    base: &Model,
    ext: &ExtensionModel,
    weight: f32,
    available: &[&ExtensionModel],
) -> LefResult<ActivationState> {
    check_compatibility(ext, &base.header, &base.meta)?;
    resolve_dependencies(ext, available)?;

    let mut blended = HashMap::new();
    let mut additive = HashMap::new();
    let mut pre_images = HashMap::new();

    for layer in ext.layer_headers.values() {
        let ext_bytes = ext.layer_bytes(layer.extension_layer_id)?;
        let ext_values = bytes_to_f32(ext_bytes);

        if layer.is_additive() {
            additive.insert(layer.extension_layer_id, ext_values);
            continue;
        }

        let base_bytes = base.layer_bytes(layer.base_layer_id)?;
        let base_values = bytes_to_f32(base_bytes);
        if base_values.len() != ext_values.len() {
            continue;
        }
        pre_images.insert(layer.base_layer_id, base_values.clone());

        let effective_weight = (weight * layer.blend_weight).clamp(0.0, 1.0);
        let result = blend_values(&base_values, &ext_values, layer.blend_mode, effective_weight);
        blended.insert(layer.base_layer_id, result);
    }

    Ok(ActivationState {
        blended,
        additive,
        pre_images,
    })
}

/// Undo a previously applied extension by returning the exact pre-blend
/// values for every base layer it touched, correct regardless of blend
/// mode, since [`ActivationState`] snapshots the pre-image rather than
/// trying to algebraically invert `Add`/`Multiply`.
pub fn deactivate_extension(state: &ActivationState) -> HashMap<u16, Vec<f32>> {
    state.pre_images.clone()
}

/// Check that every `Required` dependency is present among `available`
/// (matched by name) and that no `Conflict` dependency is present.
pub fn resolve_dependencies(
    ext: &ExtensionModel,
    available: &[&ExtensionModel],
) -> LefResult<()> {
    let names: Vec<&str> = available
        .iter()
        .map(|e| e.header.extension_name.as_str())
        .collect();

    for dep in &ext.dependencies {
        let present = names.contains(&dep.name.as_str());
        match dep.dependency_type {
            DependencyType::Required if !present => {
                return Err(LefError::InvalidArgument(format!(
                    "extension '{}' requires '{}', which is not loaded",
                    ext.header.extension_name, dep.name
                )));
            }
            DependencyType::Conflict if present => {
                return Err(LefError::InvalidArgument(format!(
                    "extension '{}' conflicts with loaded extension '{}'",
                    ext.header.extension_name, dep.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Order a set of extensions respecting each one's `Before`/`After` load
/// hints relative to its named dependency, via a topological sort (Kahn's
/// algorithm). `DontCare` edges are ignored. Cyclic `Before`/`After`
/// constraints are reported as an error rather than silently broken.
pub fn resolve_load_order<'a>(extensions: &[&'a ExtensionModel]) -> LefResult<Vec<&'a str>> {
    use crate::format::LoadOrder;

    let index_of: HashMap<&str, usize> = extensions
        .iter()
        .enumerate()
        .map(|(i, e)| (e.header.extension_name.as_str(), i))
        .collect();

    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); extensions.len()];
    let mut in_degree = vec![0usize; extensions.len()];

    for (i, ext) in extensions.iter().enumerate() {
        for dep in &ext.dependencies {
            let Some(&j) = index_of.get(dep.name.as_str()) else {
                continue;
            };
            let (from, to) = match dep.load_order {
                LoadOrder::Before => (i, j),
                LoadOrder::After => (j, i),
                LoadOrder::DontCare => continue,
            };
            edges[from].push(to);
            in_degree[to] += 1;
        }
    }

    let mut queue: Vec<usize> = (0..extensions.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(extensions.len());

    while let Some(i) = queue.pop() {
        order.push(extensions[i].header.extension_name.as_str());
        for &next in &edges[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push(next);
            }
        }
    }

    if order.len() != extensions.len() {
        return Err(LefError::InvalidArgument(
            "extension load order has a cyclic Before/After constraint".to_string(),
        ));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{
        ActivationCondition, DependencyType, ExtensionMeta, ExtensionType, Header, HeaderFlags,
        LayerHeader, LayerIndexEntry, LayerKind, LefxHeader, LefxLayerHeader, LoadOrder,
        ModelMeta, QuantizationKind,
    };
    use crate::io_ext::f32_to_bytes;
    use crate::loader::Backing;
    use std::sync::Arc;

    /// A one-layer base model (layer id 0) holding `values` as its raw
    /// tensor bytes.
    fn base_model(values: &[f32]) -> Model {
        let bytes = f32_to_bytes(values);
        let data_size = bytes.len() as u32;
        let layer_header = LayerHeader {
            layer_id: 0,
            layer_kind: LayerKind::Linear,
            quantization_type: QuantizationKind::None,
            meta_size: 0,
            data_size,
            compressed_size: 0,
            data_offset: 0,
            checksum: 0,
        };
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
                layer_id: 0,
                header_offset: 0,
                data_offset: 0,
                data_size,
            }],
            layer_headers: HashMap::from([(0, layer_header)]),
            backing: Backing::Owned(Arc::new(bytes)),
        }
    }

    /// An extension with a single layer (extension layer id 0, targeting
    /// base layer id `base_layer_id`) blending `values` in with `Replace`
    /// at full per-layer weight.
    fn ext_with_layer(values: &[f32], base_layer_id: u16) -> ExtensionModel {
        let mut ext = blank_ext("tuned");
        let bytes = f32_to_bytes(values);
        let data_size = bytes.len() as u32;
        ext.layer_headers.insert(
            0,
            LefxLayerHeader {
                extension_layer_id: 0,
                layer_kind: LayerKind::Linear,
                quantization_type: QuantizationKind::None,
                data_size,
                compressed_size: 0,
                data_offset: 0,
                checksum: 0,
                base_layer_id,
                blend_mode: BlendMode::Replace,
                activation_condition: ActivationCondition::Always,
                similarity_threshold: 0.0,
                blend_weight: 1.0,
                dependency_count: 0,
            },
        );
        ext.backing = Backing::Owned(Arc::new(bytes));
        ext
    }

    fn blank_ext(name: &str) -> ExtensionModel {
        ExtensionModel {
            header: LefxHeader {
                magic: crate::format::LEFX_MAGIC,
                version_major: 1,
                version_minor: 0,
                flags: HeaderFlags::default(),
                file_size: 0,
                timestamp: 0,
                base_model_name: "demo".to_string(),
                base_model_version: "1.0".to_string(),
                base_model_hash: 0,
                required_base_size: 0,
                extension_type: ExtensionType::Custom,
                extension_id: 0,
                extension_name: name.to_string(),
                extension_author: "lef".to_string(),
                extension_version: "1.0".to_string(),
                meta_offset: 0,
                dependency_offset: 0,
                layer_index_offset: 0,
                layer_data_offset: 0,
                plugin_data_offset: 0,
                reserved: [0u8; 8],
            },
            meta: ExtensionMeta {
                compat_min_major: 1,
                compat_min_minor: 0,
                compat_max_major: 9,
                compat_max_minor: 9,
                capability_flags: 0,
                priority: 0,
                voice_gender: crate::format::extension_meta::HINT_UNSET,
                voice_age_range: crate::format::extension_meta::HINT_UNSET,
                language_code: "en".to_string(),
                accent_code: "us".to_string(),
                quality_score: 1.0,
                performance_impact: 0.0,
                estimated_load_time_ms: 0.0,
                estimated_inference_overhead_ms: 0.0,
            },
            dependencies: Vec::new(),
            activation_rules: Vec::new(),
            layer_headers: HashMap::new(),
            backing: Backing::Owned(Arc::new(Vec::new())),
        }
    }

    fn dep(name: &str, dependency_type: DependencyType, load_order: LoadOrder) -> crate::format::Dependency {
        crate::format::Dependency {
            dependency_id: 0,
            name: name.to_string(),
            min_version: "1.0".to_string(),
            max_version: "9.9".to_string(),
            dependency_type,
            load_order,
        }
    }

    #[test]
    fn missing_required_dependency_errors() {
        let mut ext = blank_ext("speaker-a");
        ext.dependencies.push(dep("phonemizer", DependencyType::Required, LoadOrder::DontCare));
        assert!(resolve_dependencies(&ext, &[]).is_err());
    }

    #[test]
    fn present_conflict_dependency_errors() {
        let phonemizer = blank_ext("phonemizer");
        let mut ext = blank_ext("speaker-a");
        ext.dependencies.push(dep("phonemizer", DependencyType::Conflict, LoadOrder::DontCare));
        assert!(resolve_dependencies(&ext, &[&phonemizer]).is_err());
    }

    #[test]
    fn load_order_respects_before_after() {
        let mut a = blank_ext("a");
        let b = blank_ext("b");
        a.dependencies.push(dep("b", DependencyType::Optional, LoadOrder::After));
        let order = resolve_load_order(&[&a, &b]).unwrap();
        let pos_a = order.iter().position(|&n| n == "a").unwrap();
        let pos_b = order.iter().position(|&n| n == "b").unwrap();
        assert!(pos_b < pos_a);
    }

    #[test]
    fn deactivation_restores_pre_blend_values_for_add_mode() {
        let state = ActivationState {
            blended: HashMap::new(),
            additive: HashMap::new(),
            pre_images: HashMap::from([(0u16, vec![1.0, 2.0, 3.0])]),
        };
        let restored = deactivate_extension(&state);
        assert_eq!(restored.get(&0), Some(&vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn additive_layer_header_uses_always_condition_by_default() {
        let header = LefxLayerHeader {
            extension_layer_id: 0,
            layer_kind: LayerKind::Custom,
            quantization_type: QuantizationKind::None,
            data_size: 4,
            compressed_size: 0,
            data_offset: 0,
            checksum: 0,
            base_layer_id: crate::format::NO_BASE_LAYER,
            blend_mode: BlendMode::Replace,
            activation_condition: ActivationCondition::Always,
            similarity_threshold: 0.0,
            blend_weight: 1.0,
            dependency_count: 0,
        };
        assert!(header.is_additive());
    }

    #[test]
    fn apply_fails_when_base_is_incompatible() {
        let base = base_model(&[1.0, 2.0, 3.0, 4.0]);
        let mut ext = ext_with_layer(&[5.0, 6.0, 7.0, 8.0], 0);
        ext.header.base_model_name = "a-different-model".to_string();
        let result = apply_extension(&base, &ext, 1.0, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn apply_fails_when_required_dependency_is_missing() {
        let base = base_model(&[1.0, 2.0, 3.0, 4.0]);
        let mut ext = ext_with_layer(&[5.0, 6.0, 7.0, 8.0], 0);
        ext.dependencies.push(dep("phonemizer", DependencyType::Required, LoadOrder::DontCare));
        let result = apply_extension(&base, &ext, 1.0, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn apply_skips_a_size_mismatched_layer() {
        let base = base_model(&[1.0, 2.0, 3.0, 4.0]);
        let ext = ext_with_layer(&[5.0, 6.0, 7.0], 0);
        let state = apply_extension(&base, &ext, 1.0, &[]).unwrap();
        assert!(state.blended.is_empty());
        assert!(deactivate_extension(&state).is_empty());
    }

    #[test]
    fn apply_blends_a_size_matched_layer_at_full_weight() {
        let base = base_model(&[1.0, 2.0, 3.0, 4.0]);
        let ext = ext_with_layer(&[5.0, 6.0, 7.0, 8.0], 0);
        let state = apply_extension(&base, &ext, 1.0, &[]).unwrap();
        assert_eq!(state.blended.get(&0), Some(&vec![5.0, 6.0, 7.0, 8.0]));
        assert_eq!(deactivate_extension(&state).get(&0), Some(&vec![1.0, 2.0, 3.0, 4.0]));
    }
}
