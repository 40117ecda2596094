//! The loaded, queryable model: a header plus metadata plus layer index, each
//! layer's bytes reachable through whichever [`Backing`] the chosen loader
//! strategy produced.

use crate::error::{LefError, LefResult};
use crate::format::{Header, LayerHeader, LayerIndexEntry, LayerKind, ModelMeta};
use memmap2::Mmap;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a layer's raw bytes actually live. Eager and memory-borrow loaders
/// share [`Backing::Owned`] / [`Backing::Borrowed`]; the memory-mapped loader
/// uses [`Backing::Mapped`]. All three expose the same `&[u8]` view so the
/// rest of the crate never branches on loader strategy.
pub enum Backing {
    Owned(Arc<Vec<u8>>),
    Borrowed(Arc<[u8]>),
    Mapped(Arc<Mmap>),
}

impl Backing {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v.as_slice(),
            Backing::Borrowed(v) => v.as_ref(),
            Backing::Mapped(m) => m.as_ref(),
        }
    }
}

/// A fully parsed LEF model: the header and metadata are always resident,
/// layer bytes are reached lazily through `backing`.
pub struct Model {
    pub header: Header,
    pub meta: ModelMeta,
    pub layer_index: Vec<LayerIndexEntry>,
    pub layer_headers: HashMap<u16, LayerHeader>,
    pub backing: Backing,
}

impl Model {
    /// Look up a layer header by id. Spec §3.1 describes index lookup as
    /// linear over `layer_index`, but since `layer_headers` is already keyed
    /// by id after a full parse, lookup here is O(1).
    pub fn layer_by_id(&self, layer_id: u16) -> LefResult<&LayerHeader> {
        self.layer_headers
            .get(&layer_id)
            .ok_or(LefError::LayerNotFound(layer_id))
    }

    /// Raw on-disk bytes for a layer's payload (still compressed/quantized
    /// as stored; callers that need the decoded tensor go through the
    /// appropriate decode path).
    pub fn layer_bytes(&self, layer_id: u16) -> LefResult<&[u8]> {
        let header = self.layer_by_id(layer_id)?;
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

    /// A layer's payload, brotli-decompressed if it was stored compressed
    /// (`compressed_size > 0`). [`Self::layer_bytes`] returns the bytes as
    /// they sit on disk; this is what a caller wants for the actual tensor.
    pub fn decoded_layer_bytes(&self, layer_id: u16) -> LefResult<Vec<u8>> {
        let header = self.layer_by_id(layer_id)?;
        let stored = self.layer_bytes(layer_id)?;
        if header.compressed_size > 0 {
            crate::compression::decompress(stored)
        } else {
            Ok(stored.to_vec())
        }
    }

    /// Count of layers per [`LayerKind`], useful for a quick structural
    /// summary without walking the full index by hand.
    pub fn layer_kind_counts(&self) -> HashMap<LayerKind, usize> {
        let mut counts = HashMap::new();
        for header in self.layer_headers.values() {
            *counts.entry(header.layer_kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn layer_count(&self) -> usize {
        self.layer_index.len()
    }
}
