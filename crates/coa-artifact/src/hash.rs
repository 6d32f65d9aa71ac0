//! Content hashing primitives
//!
//! Provides [`ContentHash`], a strongly-typed 32-byte digest tagged with the
//! algorithm that produced it. The textual form is `<algorithm>:<hex>`, e.g.
//! `sha256:9f86d08...`, which is what the trace ledger records and what the
//! staleness check compares.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Digest algorithm used for content hashes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (default, what external trace tooling expects)
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl HashAlgorithm {
    /// Tag written before the hex digest
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    fn digest(self, data: &[u8]) -> [u8; 32] {
        match self {
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                hasher.finalize().into()
            }
            Self::Blake3 => *blake3::hash(data).as_bytes(),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(HashError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A 32-byte content digest plus the algorithm that produced it
///
/// Immutable and cheap to clone (Copy). Two hashes are equal only when both
/// the algorithm and the digest match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash {
    algorithm: HashAlgorithm,
    digest: [u8; 32],
}

impl ContentHash {
    /// Create a hash from an algorithm and raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(algorithm: HashAlgorithm, digest: [u8; 32]) -> Self {
        Self { algorithm, digest }
    }

    /// Hash arbitrary data with SHA-256
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::compute_with(HashAlgorithm::Sha256, data)
    }

    /// Hash arbitrary data with the given algorithm
    #[inline]
    #[must_use]
    pub fn compute_with(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        Self::new(algorithm, algorithm.digest(data))
    }

    /// Algorithm that produced this digest
    #[inline]
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Hex digest without the algorithm tag
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.digest[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, hex::encode(self.digest))
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, hex_digest) = s.split_once(':').ok_or(HashError::MissingAlgorithm)?;
        let algorithm: HashAlgorithm = tag.parse()?;
        let bytes = hex::decode(hex_digest)?;
        if bytes.len() != 32 {
            return Err(HashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes);
        Ok(Self::new(algorithm, digest))
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when working with content hashes
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Textual hash has no `<algorithm>:` prefix
    #[error("hash is missing its algorithm tag")]
    MissingAlgorithm,

    /// Algorithm tag not recognized
    #[error("unknown hash algorithm: '{0}'")]
    UnknownAlgorithm(String),

    /// Invalid digest length
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        let h1 = ContentHash::compute(b"hello world");
        let h2 = ContentHash::compute(b"hello world");
        assert_eq!(h1, h2);
        assert_ne!(h1, ContentHash::compute(b"hello world!"));
    }

    #[test]
    fn sha256_known_vector() {
        let hash = ContentHash::compute(b"test");
        assert_eq!(
            hash.to_string(),
            "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn algorithms_do_not_compare_equal() {
        let sha = ContentHash::compute_with(HashAlgorithm::Sha256, b"x");
        let blake = ContentHash::compute_with(HashAlgorithm::Blake3, b"x");
        assert_ne!(sha, blake);
        assert!(blake.to_string().starts_with("blake3:"));
    }

    #[test]
    fn display_and_parse() {
        let hash = ContentHash::compute_with(HashAlgorithm::Blake3, b"data");
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn parse_rejects_untagged_and_unknown() {
        let bare = hex::encode([0u8; 32]);
        assert!(matches!(bare.parse::<ContentHash>(), Err(HashError::MissingAlgorithm)));
        assert!(matches!(
            format!("md5:{bare}").parse::<ContentHash>(),
            Err(HashError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            "sha256:abcd".parse::<ContentHash>(),
            Err(HashError::InvalidLength { expected: 32, actual: 2 })
        ));
    }

    #[test]
    fn short_is_prefix_of_hex() {
        let hash = ContentHash::compute(b"test");
        assert_eq!(hash.short().len(), 16);
        assert!(hash.to_hex().starts_with(&hash.short()));
    }

    #[test]
    fn serde_uses_tagged_string() {
        let hash = ContentHash::compute(b"test");
        let json = serde_json::to_string(&hash).unwrap();
        assert!(json.starts_with("\"sha256:"));
        let decoded: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }
}
