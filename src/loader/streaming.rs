//! Streaming loader: keeps only header, metadata, and the layer index
//! resident, and faults individual layers in from disk on demand through a
//! small LRU cache: an eviction policy plus hit/miss/eviction counters.

use super::parse::parse_base;
use super::verify::verify_layer_checksums;
use crate::config::ChecksumPolicy;
use crate::crc::crc32;
use crate::error::{LefError, LefResult};
use crate::format::{Header, LayerHeader, LayerIndexEntry, ModelMeta};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

/// Cache statistics, the usual hit/miss/eviction counters an LRU cache
/// exposes so operators can reason about streaming behavior.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

struct CacheEntry {
    bytes: Arc<Vec<u8>>,
    last_used: Instant,
}

struct Inner {
    file: File,
    cache: HashMap<u16, CacheEntry>,
    cache_size_bytes: u64,
    cache_used_bytes: u64,
    stats: CacheStats,
}

/// A model whose layer payloads are faulted in from disk one at a time and
/// held in a bounded LRU cache, rather than loaded up front.
pub struct StreamingLoader {
    pub header: Header,
    pub meta: ModelMeta,
    pub layer_index: Vec<LayerIndexEntry>,
    pub layer_headers: HashMap<u16, LayerHeader>,
    checksum_policy: ChecksumPolicy,
    inner: Mutex<Inner>,
}

impl StreamingLoader {
    pub fn open(path: &Path, cache_size_bytes: u64, checksum_policy: ChecksumPolicy) -> LefResult<Self> {
        let mut file = File::open(path)?;
        let parsed = parse_base(&mut file)?;

        info!(
            path = %path.display(),
            layers = parsed.layer_index.len(),
            cache_size_bytes,
            "opened model for streaming"
        );

        Ok(Self {
            header: parsed.header,
            meta: parsed.meta,
            layer_index: parsed.layer_index,
            layer_headers: parsed.layer_headers,
            checksum_policy,
            inner: Mutex::new(Inner {
                file,
                cache: HashMap::new(),
                cache_size_bytes,
                cache_used_bytes: 0,
                stats: CacheStats::default(),
            }),
        })
    }

    pub fn layer_header(&self, layer_id: u16) -> LefResult<&LayerHeader> {
        self.layer_headers
            .get(&layer_id)
            .ok_or(LefError::LayerNotFound(layer_id))
    }

    /// Fetch a layer's stored bytes, faulting it in from disk on a cache
    /// miss and evicting least-recently-used entries if the fetch would
    /// exceed the configured cache budget.
    pub fn get_layer(&self, layer_id: u16) -> LefResult<Arc<Vec<u8>>> {
        let header = *self.layer_header(layer_id)?;
        let mut inner = self.inner.lock().expect("streaming cache lock poisoned");

        if let Some(entry) = inner.cache.get_mut(&layer_id) {
            entry.last_used = Instant::now();
            inner.stats.hits += 1;
            return Ok(Arc::clone(&entry.bytes));
        }
        inner.stats.misses += 1;

        let needed = header.stored_size() as u64;
        while inner.cache_used_bytes + needed > inner.cache_size_bytes && !inner.cache.is_empty() {
            Self::evict_one(&mut inner);
        }

        let bytes = Self::read_layer_from_disk(&mut inner.file, &header)?;
        Self::verify_one(&bytes, &header, self.header.flags, self.checksum_policy)?;

        let bytes = Arc::new(bytes);
        inner.cache_used_bytes += needed;
        inner.cache.insert(
            layer_id,
            CacheEntry {
                bytes: Arc::clone(&bytes),
                last_used: Instant::now(),
            },
        );
        debug!(layer_id, bytes = needed, "streamed layer from disk");
        Ok(bytes)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().expect("streaming cache lock poisoned").stats.clone()
    }

    /// Drop every cached layer, freeing the budget without closing the file.
    pub fn clear_cache(&self) {
        let mut inner = self.inner.lock().expect("streaming cache lock poisoned");
        inner.cache.clear();
        inner.cache_used_bytes = 0;
    }

    fn evict_one(inner: &mut Inner) {
        let victim = inner
            .cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| *id);
        if let Some(id) = victim {
            if let Some(entry) = inner.cache.remove(&id) {
                inner.cache_used_bytes = inner.cache_used_bytes.saturating_sub(entry.bytes.len() as u64);
                inner.stats.evictions += 1;
                debug!(layer_id = id, "evicted layer from streaming cache");
            }
        }
    }

    fn read_layer_from_disk(file: &mut File, header: &LayerHeader) -> LefResult<Vec<u8>> {
        file.seek(SeekFrom::Start(header.data_offset as u64))?;
        let mut buf = vec![0u8; header.stored_size() as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn verify_one(
        bytes: &[u8],
        header: &LayerHeader,
        flags: crate::format::HeaderFlags,
        policy: ChecksumPolicy,
    ) -> LefResult<()> {
        if policy == ChecksumPolicy::TrustWriterFlag
            && flags.contains(crate::format::HeaderFlags::CHECKSUM_DISABLED)
        {
            return Ok(());
        }
        if header.checksum == 0 {
            return Ok(());
        }
        let actual = crc32(bytes);
        if actual != header.checksum {
            return Err(LefError::ChecksumMismatch {
                layer_id: header.layer_id,
                expected: header.checksum,
                actual,
            });
        }
        Ok(())
    }
}

/// Convenience constructor mirroring the other loaders' `&Path` signature,
/// kept separate so call sites reading `PathBuf`s don't need an extra borrow.
pub fn open_streaming(
    path: PathBuf,
    cache_size_bytes: u64,
    checksum_policy: ChecksumPolicy,
) -> LefResult<StreamingLoader> {
    StreamingLoader::open(&path, cache_size_bytes, checksum_policy)
}
