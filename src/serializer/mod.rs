//! Writes a LEF file from scratch: a small builder that accumulates model
//! metadata and layer payloads, then assembles the whole file in one
//! deterministic pass.

mod builder;

pub use builder::LefSerializer;
