//! LEFX extension file parsing.
//!
//! On-disk layout: the dependency section is `[u32 dependency_count]
//! Dependency*N [u32 rule_count] ActivationRule*M`, and the layer-index
//! section is `[u32 layer_count] LefxLayerHeader*N`. Each `LefxLayerHeader`
//! already carries its own `data_offset`, so there is no separate pointer
//! indirection the way the base format's `LayerIndexEntry` provides.

use crate::error::{LefError, LefResult};
use crate::format::{
    ActivationRule, Dependency, ExtensionMeta, LefxHeader, LefxLayerHeader,
};
use crate::io_ext::{read_u32, write_u32};
use crate::loader::Backing;
use crate::loader::parse::{max_supported_version, MIN_SUPPORTED_VERSION};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

pub struct ExtensionModel {
    pub header: LefxHeader,
    pub meta: ExtensionMeta,
    pub dependencies: Vec<Dependency>,
    pub activation_rules: Vec<ActivationRule>,
    pub layer_headers: HashMap<u16, LefxLayerHeader>,
    pub backing: Backing,
}

impl ExtensionModel {
    pub fn layer_bytes(&self, extension_layer_id: u16) -> LefResult<&[u8]> {
        let header = self
            .layer_headers
            .get(&extension_layer_id)
            .ok_or(LefError::LayerNotFound(extension_layer_id))?;
        let start = header.data_offset as usize;
        let end = start + header.stored_size() as usize;
        let all = self.backing.as_slice();
        if end > all.len() {
            return Err(LefError::BufferTooSmall {
                needed: end,
                available: all.len(),
            });
        }
        Ok(&all[start..end])
    }
}

struct ParsedExtension {
    header: LefxHeader,
    meta: ExtensionMeta,
    dependencies: Vec<Dependency>,
    activation_rules: Vec<ActivationRule>,
    layer_headers: HashMap<u16, LefxLayerHeader>,
}

fn parse_extension<R: Read + Seek>(r: &mut R) -> LefResult<ParsedExtension> {
    let header = LefxHeader::read(r)?;

    let file_version = crate::format::Version::new(header.version_major, header.version_minor);
    if !file_version.is_supported(MIN_SUPPORTED_VERSION, max_supported_version()) {
        return Err(LefError::VersionIncompatible {
            file_major: file_version.major,
            file_minor: file_version.minor,
            min_major: MIN_SUPPORTED_VERSION.major,
            min_minor: MIN_SUPPORTED_VERSION.minor,
            max_major: max_supported_version().major,
            max_minor: max_supported_version().minor,
        });
    }

    r.seek(SeekFrom::Start(header.meta_offset as u64))?;
    let meta = ExtensionMeta::read(r)?;

    r.seek(SeekFrom::Start(header.dependency_offset as u64))?;
    let dep_count = read_u32(r)?;
    let mut dependencies = Vec::with_capacity(dep_count as usize);
    for _ in 0..dep_count {
        dependencies.push(Dependency::read(r)?);
    }
    let rule_count = read_u32(r)?;
    let mut activation_rules = Vec::with_capacity(rule_count as usize);
    for _ in 0..rule_count {
        activation_rules.push(ActivationRule::read(r)?);
    }

    r.seek(SeekFrom::Start(header.layer_index_offset as u64))?;
    let layer_count = read_u32(r)?;
    let mut layer_headers = HashMap::with_capacity(layer_count as usize);
    for _ in 0..layer_count {
        let layer_header = LefxLayerHeader::read(r)?;
        layer_headers.insert(layer_header.extension_layer_id, layer_header);
    }

    Ok(ParsedExtension {
        header,
        meta,
        dependencies,
        activation_rules,
        layer_headers,
    })
}

/// Serialize the dependency + activation-rule section in the layout
/// [`parse_extension`] expects, for use by extension writers.
pub fn write_dependency_section<W: Write>(
    w: &mut W,
    dependencies: &[Dependency],
    activation_rules: &[ActivationRule],
) -> LefResult<()> {
    write_u32(w, dependencies.len() as u32)?;
    for dep in dependencies {
        dep.write(w)?;
    }
    write_u32(w, activation_rules.len() as u32)?;
    for rule in activation_rules {
        rule.write(w)?;
    }
    Ok(())
}

/// Serialize the layer-index section in the layout [`parse_extension`]
/// expects.
pub fn write_layer_index_section<W: Write>(
    w: &mut W,
    layers: &[LefxLayerHeader],
) -> LefResult<()> {
    write_u32(w, layers.len() as u32)?;
    for layer in layers {
        layer.write(w)?;
    }
    Ok(())
}

pub fn load_extension(path: &Path) -> LefResult<ExtensionModel> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    load_extension_from_memory(&bytes)
}

pub fn load_extension_from_memory(bytes: &[u8]) -> LefResult<ExtensionModel> {
    let mut cursor = Cursor::new(bytes);
    let parsed = parse_extension(&mut cursor)?;
    Ok(ExtensionModel {
        header: parsed.header,
        meta: parsed.meta,
        dependencies: parsed.dependencies,
        activation_rules: parsed.activation_rules,
        layer_headers: parsed.layer_headers,
        backing: Backing::Borrowed(Arc::from(bytes)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ActivationCondition, BlendMode, ExtensionType, LayerKind, QuantizationKind};

    fn sample_extension_bytes() -> Vec<u8> {
        let meta_offset = crate::format::LEFX_HEADER_SIZE as u32;
        let meta_size = crate::format::extension_meta::EXTENSION_META_SIZE as u32;
        let dependency_offset = meta_offset + meta_size;

        let dep = Dependency {
            dependency_id: 1,
            name: "base".to_string(),
            min_version: "1.0".to_string(),
            max_version: "1.9".to_string(),
            dependency_type: crate::format::DependencyType::Required,
            load_order: crate::format::LoadOrder::Before,
        };
        let rule = ActivationRule {
            rule_id: 1,
            condition_type: crate::format::ConditionType::Language,
            operator: crate::format::ConditionOperator::Eq,
            condition_value: "fr".to_string(),
            activation_weight: 1.0,
            priority: 0,
        };

        let mut dep_section = Vec::new();
        write_dependency_section(&mut dep_section, &[dep], &[rule]).unwrap();
        let layer_index_offset = dependency_offset + dep_section.len() as u32;

        let payload = vec![7u8; 8];
        let layer_data_offset_guess = layer_index_offset + 4 + crate::format::lefx_layer::LEFX_LAYER_HEADER_SIZE as u32;
        let layer = LefxLayerHeader {
            extension_layer_id: 0,
            layer_kind: LayerKind::Embedding,
            quantization_type: QuantizationKind::None,
            data_size: payload.len() as u32,
            compressed_size: 0,
            data_offset: layer_data_offset_guess,
            checksum: 0,
            base_layer_id: crate::format::NO_BASE_LAYER,
            blend_mode: BlendMode::Replace,
            activation_condition: ActivationCondition::Always,
            similarity_threshold: 0.0,
            blend_weight: 1.0,
            dependency_count: 1,
        };

        let mut layer_section = Vec::new();
        write_layer_index_section(&mut layer_section, &[layer]).unwrap();

        let mut header = LefxHeader {
            magic: crate::format::LEFX_MAGIC,
            version_major: 1,
            version_minor: 0,
            flags: crate::format::HeaderFlags::default(),
            file_size: 0,
            timestamp: 0,
            base_model_name: "demo".to_string(),
            base_model_version: "1.0".to_string(),
            base_model_hash: 0,
            required_base_size: 0,
            extension_type: ExtensionType::Language,
            extension_id: 1,
            extension_name: "french".to_string(),
            extension_author: "lef".to_string(),
            extension_version: "1.0".to_string(),
            meta_offset,
            dependency_offset,
            layer_index_offset,
            layer_data_offset: layer_data_offset_guess,
            plugin_data_offset: 0,
            reserved: [0u8; 8],
        };

        let meta = ExtensionMeta {
            compat_min_major: 1,
            compat_min_minor: 0,
            compat_max_major: 9,
            compat_max_minor: 9,
            capability_flags: 0,
            priority: 0,
            voice_gender: crate::format::extension_meta::HINT_UNSET,
            voice_age_range: crate::format::extension_meta::HINT_UNSET,
            language_code: "fr".to_string(),
            accent_code: "fr".to_string(),
            quality_score: 0.9,
            performance_impact: 0.1,
            estimated_load_time_ms: 5.0,
            estimated_inference_overhead_ms: 0.5,
        };

        header.file_size = layer_data_offset_guess + payload.len() as u32;

        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        meta.write(&mut buf).unwrap();
        buf.extend_from_slice(&dep_section);
        buf.extend_from_slice(&layer_section);
        buf.extend_from_slice(&payload);
        buf
    }

    #[test]
    fn parses_a_well_formed_extension() {
        let bytes = sample_extension_bytes();
        let ext = load_extension_from_memory(&bytes).unwrap();
        assert_eq!(ext.dependencies.len(), 1);
        assert_eq!(ext.activation_rules.len(), 1);
        assert_eq!(ext.layer_bytes(0).unwrap(), &[7u8; 8]);
    }
}
