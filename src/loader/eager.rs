//! Eager loader: reads the entire file into an owned buffer up front (spec
//! §5 "eager"). Simplest strategy, highest peak memory, zero I/O once
//! loaded.

use super::model::{Backing, Model};
use super::parse::parse_base;
use super::verify::verify_layer_checksums;
use crate::config::ChecksumPolicy;
use crate::error::LefResult;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct EagerLoader;

impl EagerLoader {
    pub fn load(path: &Path, checksum_policy: ChecksumPolicy) -> LefResult<Model> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::load_from_bytes(bytes, checksum_policy)
    }

    pub fn load_from_bytes(bytes: Vec<u8>, checksum_policy: ChecksumPolicy) -> LefResult<Model> {
        let mut cursor = Cursor::new(&bytes);
        let parsed = parse_base(&mut cursor)?;

        verify_layer_checksums(
            &bytes,
            &parsed.layer_headers,
            parsed.header.flags,
            checksum_policy,
        )?;

        info!(
            layers = parsed.layer_index.len(),
            bytes = bytes.len(),
            "loaded model eagerly"
        );

        Ok(Model {
            header: parsed.header,
            meta: parsed.meta,
            layer_index: parsed.layer_index,
            layer_headers: parsed.layer_headers,
            backing: Backing::Owned(Arc::new(bytes)),
        })
    }
}
