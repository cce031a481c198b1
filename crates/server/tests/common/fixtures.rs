//! Test fixtures for generating test data.

use bytes::Bytes;

/// Smallest byte sequence recognized as a JPEG.
#[allow(dead_code)]
pub const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

/// Smallest byte sequence recognized as a PNG.
#[allow(dead_code)]
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Generate deterministic test data based on a seed.
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    for chunk in data.chunks_mut(8) {
        // Simple LCG for deterministic data
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

/// Image bytes starting with `magic`, padded with seeded data.
#[allow(dead_code)]
pub fn image_bytes(magic: &[u8], seed: u64, len: usize) -> Bytes {
    let mut data = magic.to_vec();
    if len > data.len() {
        data.extend_from_slice(&seeded_bytes(seed, len - magic.len()));
    }
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_bytes_deterministic() {
        let a = seeded_bytes(42, 100);
        let b = seeded_bytes(42, 100);
        assert_eq!(a, b);

        let c = seeded_bytes(43, 100);
        assert_ne!(a, c);
    }

    #[test]
    fn test_image_bytes_keeps_magic() {
        let data = image_bytes(PNG_MAGIC, 1, 64);
        assert_eq!(data.len(), 64);
        assert!(data.starts_with(PNG_MAGIC));
    }
}
