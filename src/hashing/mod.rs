//! Content hashing for cache keys.
//!
//! Embedding cache keys are a pure function of the text bytes. Document ids,
//! chunk ids and positions never take part, so edited text always misses.

/// 32-byte BLAKE3 digest of a text.
pub type ContentHash = [u8; 32];

#[inline]
pub fn hash_content(text: &str) -> ContentHash {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// Lowercase hex rendering of a [`ContentHash`], used in log fields.
pub fn content_hash_hex(hash: &ContentHash) -> String {
    blake3::Hash::from_bytes(*hash).to_hex().to_string()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used only for deterministic seeding (stub vectors), never as a cache key.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}
