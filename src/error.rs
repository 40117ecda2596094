use thiserror::Error;

/// Surface error taxonomy for the LEF/LEFX container format.
///
/// Every public operation that can fail returns one of these variants rather
/// than panicking; validation failures and I/O failures both propagate to the
/// caller instead of being recovered locally.
#[derive(Error, Debug)]
pub enum LefError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("file I/O error: {0}")]
    FileIo(#[from] std::io::Error),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("checksum mismatch on layer {layer_id}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        layer_id: u16,
        expected: u32,
        actual: u32,
    },

    #[error(
        "version incompatible: file is {file_major}.{file_minor}, supported range is {min_major}.{min_minor}..={max_major}.{max_minor}"
    )]
    VersionIncompatible {
        file_major: u16,
        file_minor: u16,
        min_major: u16,
        min_minor: u16,
        max_major: u16,
        max_minor: u16,
    },

    #[error("layer not found: {0}")]
    LayerNotFound(u16),

    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

pub type LefResult<T> = Result<T, LefError>;
