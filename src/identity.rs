//! Deterministic record keys for directory rows.
//!
//! The sheets are keyed by display name, which drifts: trailing spaces,
//! case, and Hangul that arrives decomposed (NFD) from macOS filenames or
//! IMEs. Keys are the SHA-256 of the NFC-normalized, trimmed, lowercased
//! name so every spelling of the same name lands on the same row.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Canonical form used for keying and loose comparison.
pub fn normalize_name(raw: &str) -> String {
    raw.nfc().collect::<String>().trim().to_lowercase()
}

fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Key for a record addressed by name alone.
pub fn record_key(name: &str) -> String {
    digest(&normalize_name(name))
}

/// Key for a record addressed by name plus employer, for disambiguating
/// contacts who share a name.
pub fn composite_key(name: &str, employer: &str) -> String {
    digest(&format!(
        "{}_{}",
        normalize_name(name),
        normalize_name(employer)
    ))
}
