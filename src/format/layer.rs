//! Layer index and layer header records.

use super::model_meta::QuantizationKind;
use crate::error::{LefError, LefResult};
use crate::io_ext::{read_u16, read_u32, read_u8, write_u16, write_u32, write_u8};
use std::io::{Read, Write};

pub const LAYER_INDEX_ENTRY_SIZE: usize = 2 + 4 + 4 + 4;
pub const LAYER_HEADER_SIZE: usize = 2 + 1 + 1 + 4 + 4 + 4 + 4 + 4;

/// Weight-tensor kind (GLOSSARY: "a named weight tensor region with a kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayerKind {
    Linear = 0,
    Conv1d = 1,
    Attention = 2,
    Embedding = 3,
    Normalization = 4,
    Activation = 5,
    Vocoder = 6,
    Custom = 7,
}

impl LayerKind {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => LayerKind::Linear,
            1 => LayerKind::Conv1d,
            2 => LayerKind::Attention,
            3 => LayerKind::Embedding,
            4 => LayerKind::Normalization,
            5 => LayerKind::Activation,
            6 => LayerKind::Vocoder,
            7 => LayerKind::Custom,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized layer kind {other}"
                )))
            }
        })
    }
}

/// Pointer into the layer-data region, iterated in write order; lookup by
/// `layer_id` is linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerIndexEntry {
    pub layer_id: u16,
    pub header_offset: u32,
    pub data_offset: u32,
    pub data_size: u32,
}

impl LayerIndexEntry {
    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        Ok(Self {
            layer_id: read_u16(r)?,
            header_offset: read_u32(r)?,
            data_offset: read_u32(r)?,
            data_size: read_u32(r)?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u16(w, self.layer_id)?;
        write_u32(w, self.header_offset)?;
        write_u32(w, self.data_offset)?;
        write_u32(w, self.data_size)?;
        Ok(())
    }
}

/// Per-layer header. `compressed_size > 0` means the payload on
/// disk is compressed and that many bytes long; `compressed_size == 0` means
/// the payload is raw and exactly `data_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerHeader {
    pub layer_id: u16,
    pub layer_kind: LayerKind,
    pub quantization_type: QuantizationKind,
    pub meta_size: u32,
    pub data_size: u32,
    pub compressed_size: u32,
    pub data_offset: u32,
    /// CRC32 of the uncompressed payload, or 0 if checksumming was disabled.
    pub checksum: u32,
}

impl LayerHeader {
    pub fn validate(&self) -> LefResult<()> {
        if self.data_size == 0 {
            return Err(LefError::InvalidFormat(format!(
                "layer {}: data_size must be > 0",
                self.layer_id
            )));
        }
        if self.compressed_size > 0 && self.compressed_size > self.data_size {
            return Err(LefError::InvalidFormat(format!(
                "layer {}: compressed_size ({}) exceeds data_size ({})",
                self.layer_id, self.compressed_size, self.data_size
            )));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let layer_id = read_u16(r)?;
        let layer_kind = LayerKind::from_u8(read_u8(r)?)?;
        let quantization_type = QuantizationKind::from_u8(read_u8(r)?)?;
        let meta_size = read_u32(r)?;
        let data_size = read_u32(r)?;
        let compressed_size = read_u32(r)?;
        let data_offset = read_u32(r)?;
        let checksum = read_u32(r)?;

        let header = LayerHeader {
            layer_id,
            layer_kind,
            quantization_type,
            meta_size,
            data_size,
            compressed_size,
            data_offset,
            checksum,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u16(w, self.layer_id)?;
        write_u8(w, self.layer_kind as u8)?;
        write_u8(w, self.quantization_type as u8)?;
        write_u32(w, self.meta_size)?;
        write_u32(w, self.data_size)?;
        write_u32(w, self.compressed_size)?;
        write_u32(w, self.data_offset)?;
        write_u32(w, self.checksum)?;
        Ok(())
    }

    /// Bytes actually occupied on disk: the compressed size if compression
    /// helped, otherwise the raw `data_size`.
    pub fn stored_size(&self) -> u32 {
        if self.compressed_size > 0 {
            self.compressed_size
        } else {
            self.data_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn index_entry_roundtrip() {
        let entry = LayerIndexEntry {
            layer_id: 3,
            header_offset: 100,
            data_offset: 140,
            data_size: 1024,
        };
        let mut buf = Vec::new();
        entry.write(&mut buf).unwrap();
        assert_eq!(buf.len(), LAYER_INDEX_ENTRY_SIZE);
        let mut cursor = Cursor::new(buf);
        assert_eq!(LayerIndexEntry::read(&mut cursor).unwrap(), entry);
    }

    #[test]
    fn layer_header_roundtrip_and_stored_size() {
        let header = LayerHeader {
            layer_id: 1,
            layer_kind: LayerKind::Attention,
            quantization_type: QuantizationKind::Int8,
            meta_size: 0,
            data_size: 2048,
            compressed_size: 900,
            data_offset: 60,
            checksum: 0xDEAD_BEEF,
        };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), LAYER_HEADER_SIZE);
        let mut cursor = Cursor::new(buf);
        let read_back = LayerHeader::read(&mut cursor).unwrap();
        assert_eq!(read_back, header);
        assert_eq!(read_back.stored_size(), 900);
    }

    #[test]
    fn rejects_compressed_size_exceeding_data_size() {
        let header = LayerHeader {
            layer_id: 1,
            layer_kind: LayerKind::Linear,
            quantization_type: QuantizationKind::None,
            meta_size: 0,
            data_size: 100,
            compressed_size: 200,
            data_offset: 0,
            checksum: 0,
        };
        assert!(header.validate().is_err());
    }
}
