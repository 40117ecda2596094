//! Model loading: three strategies sharing the same base-record parser,
//! plus checksum enforcement.

pub mod eager;
pub mod memory;
pub mod mmap;
pub mod model;
pub mod parse;
pub mod streaming;
pub mod verify;

pub use eager::EagerLoader;
pub use memory::MemoryLoader;
pub use mmap::MmapLoader;
pub use model::{Backing, Model};
pub use streaming::{open_streaming, CacheStats, StreamingLoader};

use crate::config::LoaderConfig;
use crate::error::LefResult;
use std::path::Path;

/// Which loader strategy to use for a given `load` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    Eager,
    Mmap,
}

/// Load a complete model into memory using the requested strategy. For the
/// streaming strategy, construct a [`StreamingLoader`] directly instead;
/// it has a materially different API (layers are fetched one at a time)
/// rather than returning a fully populated [`Model`].
pub fn load_model(path: &Path, strategy: LoadStrategy, config: &LoaderConfig) -> LefResult<Model> {
    match strategy {
        LoadStrategy::Eager => EagerLoader::load(path, config.checksum_policy),
        LoadStrategy::Mmap => MmapLoader::load(path, config.checksum_policy),
    }
}
