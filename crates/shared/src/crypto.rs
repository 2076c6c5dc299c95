//! Cryptographic utilities for token hashing and payload checksums.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes SHA-256 of the input and returns the first 4 bytes as an
/// uppercase hex string (8 characters).
///
/// Used as a short integrity checksum where a full digest would be
/// impractical to embed, e.g. inside printed QR payloads. Stable across
/// platforms and releases.
pub fn sha256_short_hex_upper(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode_upper(&digest[..4])
}
