//! Uniform affine quantization for weight deltas: a delta's dynamic range
//! `[lo, hi]` is mapped onto an N-bit unsigned integer grid with a single
//! scale factor and an offset (`lo`), trading precision for size.

use crate::error::{LefError, LefResult};

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedDelta {
    pub bits: u8,
    pub scale: f32,
    pub lo: f32,
    pub codes: Vec<u32>,
}

/// `Q = (1 << bits) - 1`, the highest representable code.
fn max_code(bits: u8) -> u32 {
    (1u32 << bits) - 1
}

/// Quantize `values` uniformly to `bits` bits (1-16 inclusive) using the
/// affine scheme: `lo = min(values)`, `span = max(values) - lo`,
/// `scale = span / Q`, `code = round((v - lo) / scale)` clamped to
/// `[0, Q]`. A constant input (`span == 0`) can't be assigned a meaningful
/// scale and is rejected with `CompressionFailed` rather than silently
/// quantizing to all-zero codes.
pub fn quantize(values: &[f32], bits: u8) -> LefResult<QuantizedDelta> {
    if !(1..=16).contains(&bits) {
        return Err(LefError::InvalidArgument(format!(
            "quantization bit width must be within 1..=16, got {bits}"
        )));
    }
    let lo = values.iter().fold(f32::INFINITY, |acc, &v| acc.min(v));
    let hi = values.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let span = hi - lo;
    if span == 0.0 {
        return Err(LefError::CompressionFailed(
            "quantization span is zero; delta has no dynamic range to quantize".to_string(),
        ));
    }

    let q = max_code(bits);
    let scale = span / q as f32;

    let codes = values
        .iter()
        .map(|v| (((v - lo) / scale).round() as i64).clamp(0, q as i64) as u32)
        .collect();

    Ok(QuantizedDelta { bits, scale, lo, codes })
}

pub fn dequantize(q: &QuantizedDelta) -> Vec<f32> {
    q.codes.iter().map(|&c| q.lo + c as f32 * q.scale).collect()
}
