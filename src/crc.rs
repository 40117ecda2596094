//! CRC32 integrity primitive.
//!
//! IEEE 802.3 reversed polynomial 0xEDB88320, initial value 0xFFFFFFFF, final
//! XOR 0xFFFFFFFF. The table is pre-reflected so no per-bit reflection is
//! needed at fold time. Folded into a const static table computed at build
//! time rather than a process-wide mutable global.

const POLY: u32 = 0xEDB88320;

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC32_TABLE: [u32; 256] = build_table();

/// Compute the CRC32 of `data`. Zero-length input returns 0.
pub fn crc32(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }
    let mut crc: u32 = 0xFFFFFFFF;
    for &b in data {
        let idx = ((crc ^ b as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[idx];
    }
    crc ^ 0xFFFFFFFF
}

/// Compute the model hash: a CRC32 over the canonical
/// textual form `name_version_input_output_hidden_numLayers_numHeads_vocab_
/// sampleRate_mel_hop_win`, so the hash is deterministic across platforms
/// rather than depending on a struct's in-memory layout.
#[allow(clippy::too_many_arguments)]
pub fn model_hash(
    name: &str,
    version: &str,
    input_dim: u32,
    output_dim: u32,
    hidden_dim: u32,
    num_layers: u32,
    num_heads: u32,
    vocab_size: u32,
    sample_rate: u32,
    mel_channels: u32,
    hop_length: u32,
    win_length: u32,
) -> u32 {
    let canonical = format!(
        "{name}_{version}_{input_dim}_{output_dim}_{hidden_dim}_{num_layers}_{num_heads}_{vocab_size}_{sample_rate}_{mel_channels}_{hop_length}_{win_length}"
    );
    crc32(canonical.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hashes_to_zero() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn known_vector_matches_reference_crc32() {
        // "123456789" is the standard CRC-32/ISO-HDLC check vector.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn single_byte_flip_changes_the_hash() {
        let a = crc32(b"libetude model weights");
        let mut tampered = b"libetude model weights".to_vec();
        tampered[3] ^= 0x01;
        let b = crc32(&tampered);
        assert_ne!(a, b);
    }

    #[test]
    fn model_hash_is_deterministic() {
        let h1 = model_hash("voice", "1.0", 80, 80, 512, 12, 8, 256, 22050, 80, 256, 1024);
        let h2 = model_hash("voice", "1.0", 80, 80, 512, 12, 8, 256, 22050, 80, 256, 1024);
        assert_eq!(h1, h2);
    }

    #[test]
    fn model_hash_differs_on_name_change() {
        let h1 = model_hash("voice_a", "1.0", 80, 80, 512, 12, 8, 256, 22050, 80, 256, 1024);
        let h2 = model_hash("voice_b", "1.0", 80, 80, 512, 12, 8, 256, 22050, 80, 256, 1024);
        assert_ne!(h1, h2);
    }
}
