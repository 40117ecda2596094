//! LEF file header.

use super::flags::HeaderFlags;
use super::version::Version;
use crate::error::{LefError, LefResult};
use crate::io_ext::{read_u16, read_u32, read_u64, write_u16, write_u32, write_u64};
use std::io::{Read, Write};

/// `0x4445454C`, the magic value a LEF file must begin with. Mismatch is
/// rejected before anything else is parsed.
pub const LEF_MAGIC: u32 = 0x4445_454C;

/// Packed on-disk size of `Header`, in bytes.
pub const HEADER_SIZE: usize = 4 + 2 + 2 + 4 + 4 + 4 + 8 + 4 + 4 + 4 + 16;

const RESERVED_LEN: usize = 16;

/// The code's own declared version: the current build supports {1.0, 1.0}.
pub const CODE_VERSION: Version = Version { major: 1, minor: 0 };

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub flags: HeaderFlags,
    pub file_size: u32,
    pub model_hash: u32,
    pub timestamp: u64,
    pub compression_dict_offset: u32,
    pub layer_index_offset: u32,
    pub layer_data_offset: u32,
    pub reserved: [u8; RESERVED_LEN],
}

impl Header {
    /// A header with the magic and code version pre-filled, everything else
    /// zeroed; the serializer fills the rest in as it learns it.
    pub fn init() -> Self {
        Self {
            magic: LEF_MAGIC,
            version_major: CODE_VERSION.major,
            version_minor: CODE_VERSION.minor,
            flags: HeaderFlags::default(),
            file_size: 0,
            model_hash: 0,
            timestamp: 0,
            compression_dict_offset: 0,
            layer_index_offset: 0,
            layer_data_offset: 0,
            reserved: [0u8; RESERVED_LEN],
        }
    }

    pub fn version(&self) -> Version {
        Version {
            major: self.version_major,
            minor: self.version_minor,
        }
    }

    /// Validate the header's own fields. Does not check version
    /// compatibility against the running code; callers that need that
    /// gate call [`Version::is_supported`] themselves, before continuing
    /// to parse `ModelMeta`.
    pub fn validate(&self) -> LefResult<()> {
        if self.magic != LEF_MAGIC {
            return Err(LefError::InvalidFormat(format!(
                "bad magic: expected {LEF_MAGIC:#010x}, got {:#010x}",
                self.magic
            )));
        }
        if (self.file_size as usize) < HEADER_SIZE {
            return Err(LefError::InvalidFormat(
                "file_size smaller than the header itself".to_string(),
            ));
        }
        let meta_end = HEADER_SIZE + super::model_meta::MODEL_META_SIZE;
        if (self.layer_index_offset as usize) < meta_end {
            return Err(LefError::InvalidFormat(format!(
                "layer_index_offset {} precedes header+meta ({})",
                self.layer_index_offset, meta_end
            )));
        }
        if self.layer_data_offset != 0 && self.layer_data_offset <= self.layer_index_offset {
            return Err(LefError::InvalidFormat(
                "layer_data_offset must be strictly greater than layer_index_offset".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let magic = read_u32(r)?;
        let version_major = read_u16(r)?;
        let version_minor = read_u16(r)?;
        let flags = HeaderFlags::new(read_u32(r)?);
        let file_size = read_u32(r)?;
        let model_hash = read_u32(r)?;
        let timestamp = read_u64(r)?;
        let compression_dict_offset = read_u32(r)?;
        let layer_index_offset = read_u32(r)?;
        let layer_data_offset = read_u32(r)?;
        let mut reserved = [0u8; RESERVED_LEN];
        r.read_exact(&mut reserved)?;

        let header = Header {
            magic,
            version_major,
            version_minor,
            flags,
            file_size,
            model_hash,
            timestamp,
            compression_dict_offset,
            layer_index_offset,
            layer_data_offset,
            reserved,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u32(w, self.magic)?;
        write_u16(w, self.version_major)?;
        write_u16(w, self.version_minor)?;
        write_u32(w, self.flags.bits())?;
        write_u32(w, self.file_size)?;
        write_u32(w, self.model_hash)?;
        write_u64(w, self.timestamp)?;
        write_u32(w, self.compression_dict_offset)?;
        write_u32(w, self.layer_index_offset)?;
        write_u32(w, self.layer_data_offset)?;
        w.write_all(&self.reserved)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn valid_header() -> Header {
        let mut h = Header::init();
        h.file_size = HEADER_SIZE as u32 + 200;
        h.layer_index_offset = (HEADER_SIZE + super::super::model_meta::MODEL_META_SIZE) as u32;
        h.layer_data_offset = h.layer_index_offset + 100;
        h
    }

    #[test]
    fn roundtrip_through_bytes() {
        let header = valid_header();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        let mut cursor = Cursor::new(buf);
        let read_back = Header::read(&mut cursor).unwrap();
        assert_eq!(header, read_back);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut header = valid_header();
        header.magic = 0xBAD_0BAD0;
        assert!(header.validate().is_err());
    }

    #[test]
    fn rejects_layer_data_offset_not_past_index() {
        let mut header = valid_header();
        header.layer_data_offset = header.layer_index_offset;
        assert!(header.validate().is_err());
    }

    #[test]
    fn accepts_zero_layer_data_offset() {
        let mut header = valid_header();
        header.layer_data_offset = 0;
        assert!(header.validate().is_ok());
    }
}
