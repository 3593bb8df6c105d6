//! Content fingerprints.
//!
//! A [`ContentHash`] identifies the bytes of one document; a [`PairFingerprint`] identifies an
//! ordered (reference, client) pair and seeds every deterministic identifier of a comparison.

use std::fmt;

use sha2::{Digest, Sha256};

const PAIR_DOMAIN: &[u8] = b"docdelta-pair-v1";

/// SHA-256 of a document's raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..12])
    }
}

/// Fingerprint of an ordered document pair. Swapping sides yields a different fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairFingerprint([u8; 32]);

impl PairFingerprint {
    pub fn new(reference: &ContentHash, client: &ContentHash) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(PAIR_DOMAIN);
        hasher.update(reference.as_bytes());
        hasher.update(client.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Fingerprint straight from the two documents' bytes.
    pub fn of_pair(reference: &[u8], client: &[u8]) -> Self {
        Self::new(&ContentHash::of(reference), &ContentHash::of(client))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters (at most 64).
    pub fn short(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(64));
        hex
    }
}

impl fmt::Debug for PairFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairFingerprint({})", self.short(12))
    }
}

impl fmt::Display for PairFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_sha256() {
        assert_eq!(
            ContentHash::of(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn pair_fingerprint_is_ordered() {
        let a = PairFingerprint::of_pair(b"left", b"right");
        let b = PairFingerprint::of_pair(b"right", b"left");
        assert_ne!(a, b);
        assert_eq!(a, PairFingerprint::of_pair(b"left", b"right"));
        assert_eq!(a.short(24).len(), 24);
        assert_eq!(a.short(100).len(), 64);
    }
}
