//! Model metadata record.

use crate::error::{LefError, LefResult};
use crate::io_ext::{read_fixed_str, read_u32, read_u8, write_fixed_str, write_u32, write_u8};
use std::io::{Read, Write};

pub const NAME_LEN: usize = 64;
pub const VERSION_LEN: usize = 16;
pub const AUTHOR_LEN: usize = 64;
pub const DESCRIPTION_LEN: usize = 256;

pub const MODEL_META_SIZE: usize =
    NAME_LEN + VERSION_LEN + AUTHOR_LEN + DESCRIPTION_LEN + 6 * 4 + 4 * 4 + 1 + 1 + 4;

/// `default_quantization` recognized set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuantizationKind {
    None = 0,
    Fp16 = 1,
    Bf16 = 2,
    Int8 = 3,
    Int4 = 4,
    Mixed = 5,
}

impl QuantizationKind {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => QuantizationKind::None,
            1 => QuantizationKind::Fp16,
            2 => QuantizationKind::Bf16,
            3 => QuantizationKind::Int8,
            4 => QuantizationKind::Int4,
            5 => QuantizationKind::Mixed,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized quantization kind {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMeta {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,

    pub input_dim: u32,
    pub output_dim: u32,
    pub hidden_dim: u32,
    pub num_layers: u32,
    pub num_heads: u32,
    pub vocab_size: u32,

    pub sample_rate: u32,
    pub mel_channels: u32,
    pub hop_length: u32,
    pub win_length: u32,

    pub default_quantization: QuantizationKind,
    pub mixed_precision: bool,
    pub quantization_params_size: u32,
}

impl ModelMeta {
    pub fn validate(&self) -> LefResult<()> {
        if self.name.is_empty() {
            return Err(LefError::InvalidFormat("model name is empty".to_string()));
        }
        for (label, dim) in [
            ("input_dim", self.input_dim),
            ("output_dim", self.output_dim),
            ("hidden_dim", self.hidden_dim),
            ("num_layers", self.num_layers),
            ("num_heads", self.num_heads),
            ("vocab_size", self.vocab_size),
        ] {
            if dim == 0 {
                return Err(LefError::InvalidFormat(format!("{label} must be > 0")));
            }
        }
        for (label, v) in [
            ("sample_rate", self.sample_rate),
            ("mel_channels", self.mel_channels),
            ("hop_length", self.hop_length),
            ("win_length", self.win_length),
        ] {
            if v == 0 {
                return Err(LefError::InvalidFormat(format!("{label} must be > 0")));
            }
        }
        if self.hop_length > self.win_length {
            return Err(LefError::InvalidFormat(
                "hop_length must be <= win_length".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let name = read_fixed_str(r, NAME_LEN)?;
        let version = read_fixed_str(r, VERSION_LEN)?;
        let author = read_fixed_str(r, AUTHOR_LEN)?;
        let description = read_fixed_str(r, DESCRIPTION_LEN)?;

        let input_dim = read_u32(r)?;
        let output_dim = read_u32(r)?;
        let hidden_dim = read_u32(r)?;
        let num_layers = read_u32(r)?;
        let num_heads = read_u32(r)?;
        let vocab_size = read_u32(r)?;

        let sample_rate = read_u32(r)?;
        let mel_channels = read_u32(r)?;
        let hop_length = read_u32(r)?;
        let win_length = read_u32(r)?;

        let default_quantization = QuantizationKind::from_u8(read_u8(r)?)?;
        let mixed_precision = read_u8(r)? != 0;
        let quantization_params_size = read_u32(r)?;

        let meta = ModelMeta {
            name,
            version,
            author,
            description,
            input_dim,
            output_dim,
            hidden_dim,
            num_layers,
            num_heads,
            vocab_size,
            sample_rate,
            mel_channels,
            hop_length,
            win_length,
            default_quantization,
            mixed_precision,
            quantization_params_size,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_fixed_str(w, &self.name, NAME_LEN)?;
        write_fixed_str(w, &self.version, VERSION_LEN)?;
        write_fixed_str(w, &self.author, AUTHOR_LEN)?;
        write_fixed_str(w, &self.description, DESCRIPTION_LEN)?;

        write_u32(w, self.input_dim)?;
        write_u32(w, self.output_dim)?;
        write_u32(w, self.hidden_dim)?;
        write_u32(w, self.num_layers)?;
        write_u32(w, self.num_heads)?;
        write_u32(w, self.vocab_size)?;

        write_u32(w, self.sample_rate)?;
        write_u32(w, self.mel_channels)?;
        write_u32(w, self.hop_length)?;
        write_u32(w, self.win_length)?;

        write_u8(w, self.default_quantization as u8)?;
        write_u8(w, self.mixed_precision as u8)?;
        write_u32(w, self.quantization_params_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> ModelMeta {
        ModelMeta {
            name: "demo-voice".to_string(),
            version: "1.0".to_string(),
            author: "lef".to_string(),
            description: "test model".to_string(),
            input_dim: 80,
            output_dim: 80,
            hidden_dim: 512,
            num_layers: 3,
            num_heads: 8,
            vocab_size: 256,
            sample_rate: 22050,
            mel_channels: 80,
            hop_length: 256,
            win_length: 1024,
            default_quantization: QuantizationKind::None,
            mixed_precision: false,
            quantization_params_size: 0,
        }
    }

    #[test]
    fn roundtrip() {
        let meta = sample();
        let mut buf = Vec::new();
        meta.write(&mut buf).unwrap();
        assert_eq!(buf.len(), MODEL_META_SIZE);
        let mut cursor = Cursor::new(buf);
        assert_eq!(ModelMeta::read(&mut cursor).unwrap(), meta);
    }

    #[test]
    fn rejects_hop_greater_than_win() {
        let mut meta = sample();
        meta.hop_length = 2048;
        assert!(meta.validate().is_err());
    }

    #[test]
    fn rejects_empty_name() {
        let mut meta = sample();
        meta.name = String::new();
        assert!(meta.validate().is_err());
    }

    #[test]
    fn rejects_zero_dim() {
        let mut meta = sample();
        meta.num_heads = 0;
        assert!(meta.validate().is_err());
    }
}
