//! LEFX extension-file header.

use super::flags::HeaderFlags;
use crate::error::{LefError, LefResult};
use crate::io_ext::{
    read_fixed_str, read_u16, read_u32, read_u64, read_u8, write_fixed_str, write_u16, write_u32,
    write_u64, write_u8,
};
use std::io::{Read, Write};

/// Distinct from [`crate::format::header::LEF_MAGIC`] so a reader can tell a
/// base model and an extension apart from the first four bytes.
pub const LEFX_MAGIC: u32 = 0x5846_454C;

pub const BASE_NAME_LEN: usize = 64;
pub const BASE_VERSION_LEN: usize = 16;
pub const EXT_NAME_LEN: usize = 64;
pub const EXT_AUTHOR_LEN: usize = 64;
pub const EXT_VERSION_LEN: usize = 16;
const RESERVED_LEN: usize = 8;

pub const LEFX_HEADER_SIZE: usize = 4
    + 2
    + 2
    + 4
    + 4
    + 8
    + BASE_NAME_LEN
    + BASE_VERSION_LEN
    + 4
    + 4
    + 1
    + 4
    + EXT_NAME_LEN
    + EXT_AUTHOR_LEN
    + EXT_VERSION_LEN
    + 4 * 5
    + RESERVED_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtensionType {
    Speaker = 0,
    Language = 1,
    Emotion = 2,
    Style = 3,
    Effect = 4,
    Custom = 5,
}

impl ExtensionType {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => ExtensionType::Speaker,
            1 => ExtensionType::Language,
            2 => ExtensionType::Emotion,
            3 => ExtensionType::Style,
            4 => ExtensionType::Effect,
            5 => ExtensionType::Custom,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized extension type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LefxHeader {
    pub magic: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub flags: HeaderFlags,
    pub file_size: u32,
    pub timestamp: u64,

    pub base_model_name: String,
    pub base_model_version: String,
    /// The CRC32 the base model must hash to, or 0 to skip that check.
    pub base_model_hash: u32,
    pub required_base_size: u32,

    pub extension_type: ExtensionType,
    pub extension_id: u32,
    pub extension_name: String,
    pub extension_author: String,
    pub extension_version: String,

    pub meta_offset: u32,
    pub dependency_offset: u32,
    pub layer_index_offset: u32,
    pub layer_data_offset: u32,
    pub plugin_data_offset: u32,

    pub reserved: [u8; RESERVED_LEN],
}

impl LefxHeader {
    pub fn validate(&self) -> LefResult<()> {
        if self.magic != LEFX_MAGIC {
            return Err(LefError::InvalidFormat(format!(
                "bad LEFX magic: expected {LEFX_MAGIC:#010x}, got {:#010x}",
                self.magic
            )));
        }
        if self.extension_name.is_empty() {
            return Err(LefError::InvalidFormat(
                "extension_name is empty".to_string(),
            ));
        }
        if self.extension_version.is_empty() {
            return Err(LefError::InvalidFormat(
                "extension_version is empty".to_string(),
            ));
        }
        if self.base_model_name.is_empty() {
            // An empty base_model_name would simply skip that part of the
            // compatibility check, but this header's own validator still
            // demands non-empty extension name/version/base-name/base-version.
            return Err(LefError::InvalidFormat(
                "base_model_name is empty".to_string(),
            ));
        }
        if self.base_model_version.is_empty() {
            return Err(LefError::InvalidFormat(
                "base_model_version is empty".to_string(),
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
        let timestamp = read_u64(r)?;

        let base_model_name = read_fixed_str(r, BASE_NAME_LEN)?;
        let base_model_version = read_fixed_str(r, BASE_VERSION_LEN)?;
        let base_model_hash = read_u32(r)?;
        let required_base_size = read_u32(r)?;

        let extension_type = ExtensionType::from_u8(read_u8(r)?)?;
        let extension_id = read_u32(r)?;
        let extension_name = read_fixed_str(r, EXT_NAME_LEN)?;
        let extension_author = read_fixed_str(r, EXT_AUTHOR_LEN)?;
        let extension_version = read_fixed_str(r, EXT_VERSION_LEN)?;

        let meta_offset = read_u32(r)?;
        let dependency_offset = read_u32(r)?;
        let layer_index_offset = read_u32(r)?;
        let layer_data_offset = read_u32(r)?;
        let plugin_data_offset = read_u32(r)?;

        let mut reserved = [0u8; RESERVED_LEN];
        r.read_exact(&mut reserved)?;

        let header = LefxHeader {
            magic,
            version_major,
            version_minor,
            flags,
            file_size,
            timestamp,
            base_model_name,
            base_model_version,
            base_model_hash,
            required_base_size,
            extension_type,
            extension_id,
            extension_name,
            extension_author,
            extension_version,
            meta_offset,
            dependency_offset,
            layer_index_offset,
            layer_data_offset,
            plugin_data_offset,
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
        write_u64(w, self.timestamp)?;

        write_fixed_str(w, &self.base_model_name, BASE_NAME_LEN)?;
        write_fixed_str(w, &self.base_model_version, BASE_VERSION_LEN)?;
        write_u32(w, self.base_model_hash)?;
        write_u32(w, self.required_base_size)?;

        write_u8(w, self.extension_type as u8)?;
        write_u32(w, self.extension_id)?;
        write_fixed_str(w, &self.extension_name, EXT_NAME_LEN)?;
        write_fixed_str(w, &self.extension_author, EXT_AUTHOR_LEN)?;
        write_fixed_str(w, &self.extension_version, EXT_VERSION_LEN)?;

        write_u32(w, self.meta_offset)?;
        write_u32(w, self.dependency_offset)?;
        write_u32(w, self.layer_index_offset)?;
        write_u32(w, self.layer_data_offset)?;
        write_u32(w, self.plugin_data_offset)?;

        w.write_all(&self.reserved)?;
        Ok(())
    }
}
