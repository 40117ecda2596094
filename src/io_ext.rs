//! Little-endian primitive readers/writers shared by every format record.
//!
//! Generalized over any `Read`/`Write` so the same code parses an on-disk
//! `File`, a memory-mapped region, or a borrowed in-memory buffer without
//! duplication.

use crate::error::{LefError, LefResult};
use std::io::{Read, Write};

pub fn read_u8<R: Read>(r: &mut R) -> LefResult<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16<R: Read>(r: &mut R) -> LefResult<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32<R: Read>(r: &mut R) -> LefResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64<R: Read>(r: &mut R) -> LefResult<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_f32<R: Read>(r: &mut R) -> LefResult<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a fixed-width char array field, trimming trailing NUL padding.
pub fn read_fixed_str<R: Read>(r: &mut R, width: usize) -> LefResult<String> {
    let mut buf = vec![0u8; width];
    r.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8(buf[..end].to_vec())
        .map_err(|e| LefError::InvalidFormat(format!("non-UTF8 fixed string: {e}")))
}

pub fn read_bytes<R: Read>(r: &mut R, len: usize) -> LefResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reinterpret a raw little-endian payload as a dense `f32` tensor. Used
/// anywhere a layer's stored bytes need to become weight values: blending,
/// differential encoding.
pub fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// The inverse of [`bytes_to_f32`]: pack a dense `f32` tensor back into its
/// little-endian on-disk representation.
pub fn f32_to_bytes(values: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> LefResult<()> {
    w.write_all(&[v])?;
    Ok(())
}

pub fn write_u16<W: Write>(w: &mut W, v: u16) -> LefResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> LefResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_u64<W: Write>(w: &mut W, v: u64) -> LefResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_f32<W: Write>(w: &mut W, v: f32) -> LefResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a string into a fixed-width field, NUL-padded, failing if it does
/// not fit. `set_model_info` relies on this to validate lengths against
/// fixed buffers.
pub fn write_fixed_str<W: Write>(w: &mut W, s: &str, width: usize) -> LefResult<()> {
    if s.len() >= width {
        return Err(LefError::InvalidArgument(format!(
            "string '{s}' ({} bytes) does not fit in a {width}-byte field",
            s.len()
        )));
    }
    let mut buf = vec![0u8; width];
    buf[..s.len()].copy_from_slice(s.as_bytes());
    w.write_all(&buf)?;
    Ok(())
}
