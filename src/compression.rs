//! Per-layer payload compression. `add_layer` consults a small policy that
//! picks an algorithm and level from layer_kind, size, and
//! quantization_type. Brotli is the only algorithm in the policy today, so
//! "picks an algorithm" reduces to picking a quality/window pair.

use crate::error::{LefError, LefResult};
use crate::format::{LayerKind, QuantizationKind};
use std::io::{Cursor, Read, Write};

/// Sliding window passed to both the encoder and decoder; 22 is brotli's
/// maximum and costs nothing extra for the payload sizes this format deals
/// in (a few KB to tens of MB of weight data).
const LGWIN: u32 = 22;
const BUFFER_SIZE: usize = 4096;

/// Map the caller's `enable_compression(level)` knob (1-9) onto
/// brotli's quality scale (0-11), derating already-quantized payloads since
/// a uniform quantization grid leaves little redundancy for brotli to find.
pub fn pick_quality(layer_kind: LayerKind, quantization_type: QuantizationKind, configured_level: u8) -> u32 {
    let base = ((configured_level as u32 * 11) / 9).min(11).max(1);
    let _ = layer_kind; // kind does not currently shift quality, only quantization does
    if quantization_type == QuantizationKind::None {
        base
    } else {
        base.saturating_sub(3).max(1)
    }
}

/// Compress `data` at the given brotli quality. Always succeeds; whether the
/// result is actually smaller than `data` is the caller's decision (spec
/// §4.3: "if the compressed bytes are strictly smaller... otherwise writes
/// the raw bytes").
pub fn compress(data: &[u8], quality: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = brotli::CompressorWriter::new(&mut out, BUFFER_SIZE, quality, LGWIN);
        encoder
            .write_all(data)
            .expect("compressing into an in-memory Vec cannot fail");
    }
    out
}

/// Inverse of [`compress`].
pub fn decompress(data: &[u8]) -> LefResult<Vec<u8>> {
    let mut decoder = brotli::Decompressor::new(Cursor::new(data), BUFFER_SIZE);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| LefError::CompressionFailed(format!("brotli decompression failed: {e}")))?;
    Ok(out)
}
