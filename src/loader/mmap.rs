//! Memory-mapped loader: maps the file read-only via `memmap2` instead of
//! copying it into a heap buffer. Lets the OS page cache do the work; well
//! suited to large models where only a subset of layers are ever actually
//! touched.

use super::model::{Backing, Model};
use super::parse::parse_base;
use super::verify::verify_layer_checksums;
use crate::config::ChecksumPolicy;
use crate::error::LefResult;
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct MmapLoader;

impl MmapLoader {
    pub fn load(path: &Path, checksum_policy: ChecksumPolicy) -> LefResult<Model> {
        let file = File::open(path)?;
        // Safety: memmap2's contract requires the backing file not be
        // truncated out from under the mapping while it's alive; callers
        // loading from a path they don't control concurrently mutating
        // accept that risk.
        let mmap = unsafe { Mmap::map(&file)? };

        let mut cursor = Cursor::new(mmap.as_ref());
        let parsed = parse_base(&mut cursor)?;

        verify_layer_checksums(
            mmap.as_ref(),
            &parsed.layer_headers,
            parsed.header.flags,
            checksum_policy,
        )?;

        info!(
            layers = parsed.layer_index.len(),
            bytes = mmap.len(),
            "loaded model via mmap"
        );

        Ok(Model {
            header: parsed.header,
            meta: parsed.meta,
            layer_index: parsed.layer_index,
            layer_headers: parsed.layer_headers,
            backing: Backing::Mapped(Arc::new(mmap)),
        })
    }
}
