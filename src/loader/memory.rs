//! Memory loader: builds a model from a caller-supplied in-memory buffer
//! rather than opening a file. Useful when the bytes already live in
//! memory (downloaded, decrypted, or embedded) and the caller wants to
//! skip a redundant file round-trip.
//!
//! The loaded `Model` holds its own reference-counted copy of the bytes
//! (`Arc<[u8]>`) rather than a true borrow against the caller's lifetime, so
//! `Model` stays lifetime-free like the eager and mmap loaders; the
//! distinction from [`super::eager::EagerLoader`] is the absence of any
//! `File`/path I/O, not the absence of a copy.

use super::model::{Backing, Model};
use super::parse::parse_base;
use super::verify::verify_layer_checksums;
use crate::config::ChecksumPolicy;
use crate::error::LefResult;
use std::io::Cursor;
use std::sync::Arc;

pub struct MemoryLoader;

impl MemoryLoader {
    pub fn load_from_slice(bytes: &[u8], checksum_policy: ChecksumPolicy) -> LefResult<Model> {
        let mut cursor = Cursor::new(bytes);
        let parsed = parse_base(&mut cursor)?;

        verify_layer_checksums(
            bytes,
            &parsed.layer_headers,
            parsed.header.flags,
            checksum_policy,
        )?;

        Ok(Model {
            header: parsed.header,
            meta: parsed.meta,
            layer_index: parsed.layer_index,
            layer_headers: parsed.layer_headers,
            backing: Backing::Borrowed(Arc::from(bytes)),
        })
    }
}
