//! Extension layer header.

use super::layer::LayerKind;
use super::model_meta::QuantizationKind;
use crate::error::{LefError, LefResult};
use crate::io_ext::{read_f32, read_u16, read_u32, read_u8, write_f32, write_u16, write_u32, write_u8};
use std::io::{Read, Write};

pub const LEFX_LAYER_HEADER_SIZE: usize = 2 + 1 + 1 + 4 + 4 + 4 + 4 + 4 + 2 + 2 + 1 + 1 + 4 + 4 + 2;

/// Marks an extension layer that adds a brand-new layer rather than blending
/// with an existing base layer.
pub const NO_BASE_LAYER: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlendMode {
    Replace = 0,
    Add = 1,
    Multiply = 2,
    Interpolate = 3,
}

impl BlendMode {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => BlendMode::Replace,
            1 => BlendMode::Add,
            2 => BlendMode::Multiply,
            3 => BlendMode::Interpolate,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized blend mode {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActivationCondition {
    Always = 0,
    Conditional = 1,
}

impl ActivationCondition {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => ActivationCondition::Always,
            1 => ActivationCondition::Conditional,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized activation condition {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LefxLayerHeader {
    pub extension_layer_id: u16,
    pub layer_kind: LayerKind,
    pub quantization_type: QuantizationKind,
    pub data_size: u32,
    pub compressed_size: u32,
    pub data_offset: u32,
    pub checksum: u32,

    /// [`NO_BASE_LAYER`] when this layer has no corresponding base layer to
    /// blend against.
    pub base_layer_id: u16,
    pub blend_mode: BlendMode,
    pub activation_condition: ActivationCondition,

    /// Only meaningful when [`BlendMode::Interpolate`] is in play: the
    /// minimum cosine similarity to the base layer required before the
    /// blend is applied at all.
    pub similarity_threshold: f32,
    pub blend_weight: f32,
    pub dependency_count: u16,
}

impl LefxLayerHeader {
    pub fn validate(&self) -> LefResult<()> {
        if self.data_size == 0 {
            return Err(LefError::InvalidFormat(format!(
                "extension layer {}: data_size must be > 0",
                self.extension_layer_id
            )));
        }
        if self.compressed_size > 0 && self.compressed_size > self.data_size {
            return Err(LefError::InvalidFormat(format!(
                "extension layer {}: compressed_size ({}) exceeds data_size ({})",
                self.extension_layer_id, self.compressed_size, self.data_size
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(LefError::InvalidFormat(format!(
                "similarity_threshold must be within [0.0, 1.0], got {}",
                self.similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.blend_weight) {
            return Err(LefError::InvalidFormat(format!(
                "blend_weight must be within [0.0, 1.0], got {}",
                self.blend_weight
            )));
        }
        if self.base_layer_id == NO_BASE_LAYER && self.blend_mode != BlendMode::Replace {
            return Err(LefError::InvalidFormat(
                "an extension layer with no base counterpart must use BlendMode::Replace"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let extension_layer_id = read_u16(r)?;
        let layer_kind = LayerKind::from_u8(read_u8(r)?)?;
        let quantization_type = QuantizationKind::from_u8(read_u8(r)?)?;
        let data_size = read_u32(r)?;
        let compressed_size = read_u32(r)?;
        let data_offset = read_u32(r)?;
        let checksum = read_u32(r)?;
        let base_layer_id = read_u16(r)?;
        let blend_mode = BlendMode::from_u8(read_u8(r)?)?;
        let activation_condition = ActivationCondition::from_u8(read_u8(r)?)?;
        let similarity_threshold = read_f32(r)?;
        let blend_weight = read_f32(r)?;
        let dependency_count = read_u16(r)?;

        let header = LefxLayerHeader {
            extension_layer_id,
            layer_kind,
            quantization_type,
            data_size,
            compressed_size,
            data_offset,
            checksum,
            base_layer_id,
            blend_mode,
            activation_condition,
            similarity_threshold,
            blend_weight,
            dependency_count,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u16(w, self.extension_layer_id)?;
        write_u8(w, self.layer_kind as u8)?;
        write_u8(w, self.quantization_type as u8)?;
        write_u32(w, self.data_size)?;
        write_u32(w, self.compressed_size)?;
        write_u32(w, self.data_offset)?;
        write_u32(w, self.checksum)?;
        write_u16(w, self.base_layer_id)?;
        write_u8(w, self.blend_mode as u8)?;
        write_u8(w, self.activation_condition as u8)?;
        write_f32(w, self.similarity_threshold)?;
        write_f32(w, self.blend_weight)?;
        write_u16(w, self.dependency_count)?;
        Ok(())
    }

    pub fn stored_size(&self) -> u32 {
        if self.compressed_size > 0 {
            self.compressed_size
        } else {
            self.data_size
        }
    }

    pub fn is_additive(&self) -> bool {
        self.base_layer_id == NO_BASE_LAYER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> LefxLayerHeader {
        LefxLayerHeader {
            extension_layer_id: 0,
            layer_kind: LayerKind::Embedding,
            quantization_type: QuantizationKind::Fp16,
            data_size: 4096,
            compressed_size: 0,
            data_offset: 0,
            checksum: 0x1234_5678,
            base_layer_id: 2,
            blend_mode: BlendMode::Interpolate,
            activation_condition: ActivationCondition::Conditional,
            similarity_threshold: 0.6,
            blend_weight: 0.5,
            dependency_count: 0,
        }
    }

    #[test]
    fn roundtrip() {
        let header = sample();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), LEFX_LAYER_HEADER_SIZE);
        let mut cursor = Cursor::new(buf);
        assert_eq!(LefxLayerHeader::read(&mut cursor).unwrap(), header);
    }

    #[test]
    fn additive_layer_requires_replace_mode() {
        let mut header = sample();
        header.base_layer_id = NO_BASE_LAYER;
        header.blend_mode = BlendMode::Add;
        assert!(header.validate().is_err());
    }

    #[test]
    fn additive_layer_with_replace_mode_is_valid() {
        let mut header = sample();
        header.base_layer_id = NO_BASE_LAYER;
        header.blend_mode = BlendMode::Replace;
        assert!(header.validate().is_ok());
        assert!(header.is_additive());
    }

    #[test]
    fn rejects_similarity_threshold_out_of_range() {
        let mut header = sample();
        header.similarity_threshold = 1.2;
        assert!(header.validate().is_err());
    }
}
