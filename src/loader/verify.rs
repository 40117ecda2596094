//! Checksum verification policy enforcement.

use crate::config::ChecksumPolicy;
use crate::crc::crc32;
use crate::error::{LefError, LefResult};
use crate::format::{HeaderFlags, LayerHeader};
use std::collections::HashMap;

/// Verify every layer's stored bytes against its recorded checksum, honoring
/// the configured policy. `TrustWriterFlag` skips verification entirely when
/// the writer set [`HeaderFlags::CHECKSUM_DISABLED`]; a per-layer checksum of
/// `0` always skips that one layer, since a writer can only reach `0` by
/// disabling checksums for that layer specifically.
pub fn verify_layer_checksums(
    backing: &[u8],
    layer_headers: &HashMap<u16, LayerHeader>,
    flags: HeaderFlags,
    policy: ChecksumPolicy,
) -> LefResult<()> {
    if policy == ChecksumPolicy::TrustWriterFlag && flags.contains(HeaderFlags::CHECKSUM_DISABLED) {
        return Ok(());
    }

    for header in layer_headers.values() {
        if header.checksum == 0 {
            continue;
        }
        let start = header.data_offset as usize;
        let end = start + header.stored_size() as usize;
        if end > backing.len() {
            return Err(LefError::BufferTooSmall {
                needed: end,
                available: backing.len(),
            });
        }
        let actual = crc32(&backing[start..end]);
        if actual != header.checksum {
            return Err(LefError::ChecksumMismatch {
                layer_id: header.layer_id,
                expected: header.checksum,
                actual,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{LayerKind, QuantizationKind};

    fn header_for(data: &[u8], checksum: u32) -> LayerHeader {
        LayerHeader {
            layer_id: 0,
            layer_kind: LayerKind::Linear,
            quantization_type: QuantizationKind::None,
            meta_size: 0,
            data_size: data.len() as u32,
            compressed_size: 0,
            data_offset: 0,
            checksum,
        }
    }

    #[test]
    fn matching_checksum_passes() {
        let data = vec![1u8, 2, 3, 4];
        let mut headers = HashMap::new();
        headers.insert(0, header_for(&data, crc32(&data)));
        assert!(verify_layer_checksums(
            &data,
            &headers,
            HeaderFlags::default(),
            ChecksumPolicy::AlwaysVerify
        )
        .is_ok());
    }

    #[test]
    fn tampered_bytes_are_caught() {
        let data = vec![1u8, 2, 3, 4];
        let mut headers = HashMap::new();
        headers.insert(0, header_for(&data, crc32(&data)));
        let mut tampered = data.clone();
        tampered[0] = 0xFF;
        assert!(verify_layer_checksums(
            &tampered,
            &headers,
            HeaderFlags::default(),
            ChecksumPolicy::AlwaysVerify
        )
        .is_err());
    }

    #[test]
    fn trust_writer_flag_skips_when_disabled() {
        let data = vec![1u8, 2, 3, 4];
        let mut headers = HashMap::new();
        headers.insert(0, header_for(&data, 0xDEAD_BEEF));
        let mut flags = HeaderFlags::default();
        flags.set(HeaderFlags::CHECKSUM_DISABLED);
        assert!(verify_layer_checksums(&data, &headers, flags, ChecksumPolicy::TrustWriterFlag)
            .is_ok());
    }

    #[test]
    fn zero_checksum_skips_that_layer_even_under_always_verify() {
        let data = vec![1u8, 2, 3, 4];
        let mut headers = HashMap::new();
        headers.insert(0, header_for(&data, 0));
        assert!(verify_layer_checksums(
            &data,
            &headers,
            HeaderFlags::default(),
            ChecksumPolicy::AlwaysVerify
        )
        .is_ok());
    }
}
