//! Shared base-record parsing, used by all three loader strategies (spec
//! §5). Generic over `Read + Seek` so the exact same walk works against a
//! `File`, an in-memory `Cursor<&[u8]>`, or a `Cursor<Vec<u8>>`.

use crate::error::{LefError, LefResult};
use crate::format::{Header, LayerHeader, LayerIndexEntry, ModelMeta, Version};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

/// Oldest file version this build will read at all.
pub const MIN_SUPPORTED_VERSION: Version = Version { major: 1, minor: 0 };

pub fn max_supported_version() -> Version {
    crate::format::CODE_VERSION
}

pub struct ParsedBase {
    pub header: Header,
    pub meta: ModelMeta,
    pub layer_index: Vec<LayerIndexEntry>,
    pub layer_headers: HashMap<u16, LayerHeader>,
}

/// Read and validate header, model metadata, and the full layer index +
/// per-layer headers. Does not touch layer payload bytes.
pub fn parse_base<R: Read + Seek>(r: &mut R) -> LefResult<ParsedBase> {
    let header = Header::read(r)?;
    let file_version = header.version();
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

    let meta = ModelMeta::read(r)?;

    r.seek(SeekFrom::Start(header.layer_index_offset as u64))?;
    let mut layer_index = Vec::with_capacity(meta.num_layers as usize);
    for _ in 0..meta.num_layers {
        layer_index.push(LayerIndexEntry::read(r)?);
    }

    let mut layer_headers = HashMap::with_capacity(layer_index.len());
    for entry in &layer_index {
        r.seek(SeekFrom::Start(entry.header_offset as u64))?;
        let layer_header = LayerHeader::read(r)?;
        if layer_header.layer_id != entry.layer_id {
            return Err(LefError::InvalidFormat(format!(
                "layer index entry {} points at a header for layer {}",
                entry.layer_id, layer_header.layer_id
            )));
        }
        layer_headers.insert(entry.layer_id, layer_header);
    }

    Ok(ParsedBase {
        header,
        meta,
        layer_index,
        layer_headers,
    })
}
