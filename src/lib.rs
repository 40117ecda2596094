//! LEF/LEFX neural TTS model container format.
//!
//! A LEF file carries one text-to-speech model's weights, self-describing
//! through a fixed header and metadata record (see [`format`]). Three loader
//! strategies (see [`loader`]) expose the same [`loader::Model`] view over an
//! owned buffer, a memory-mapped file, or an on-demand streamed cache. An
//! extension file (LEFX) encodes a speaker/language/style variant either as a
//! per-layer blend against a base model or as additive new layers (see
//! [`extension`]); [`diff`] computes the compact delta such an extension
//! stores, and [`activation`] decides at runtime which registered extensions
//! are active and at what weight.

pub mod activation;
pub mod compression;
pub mod config;
pub mod crc;
pub mod diff;
pub mod error;
pub mod extension;
pub mod format;
pub mod io_ext;
pub mod loader;
pub mod logging;
pub mod serializer;

pub use error::{LefError, LefResult};
