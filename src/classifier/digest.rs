//! Content digests used to recognise placeholder images.
//!
//! MD5 over the raw file bytes is the default, so `md5sum` output can be used
//! as a hash list directly. SHA-256 and BLAKE3 are available for lists
//! produced with other tools.
//!
//! Lists written for the JavaScript ancestor of this tool hash the bytes as a
//! comma-separated string of decimal values (`"137,80,78,..."`), which is
//! what [`DigestAlgorithm::Md5Decimal`] reproduces.

use std::fmt::Write as _;

use clap::ValueEnum;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Turns file content into a stable lowercase hex string.
pub trait ContentDigest {
    /// Digest `bytes`.
    fn digest(&self, bytes: &[u8]) -> String;

    /// Short algorithm name for logs.
    fn name(&self) -> &'static str;
}

/// Built-in digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5 (32 hex characters).
    #[default]
    Md5,
    /// SHA-256 (64 hex characters).
    Sha256,
    /// BLAKE3 (64 hex characters).
    Blake3,
    /// MD5 of the bytes written as comma-separated decimals (32 hex characters).
    #[serde(rename = "md5-decimal")]
    #[value(name = "md5-decimal")]
    Md5Decimal,
}

impl DigestAlgorithm {
    /// Length of a hex digest produced by this algorithm.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 | Self::Md5Decimal => 32,
            Self::Sha256 | Self::Blake3 => 64,
        }
    }

    /// Whether `candidate` looks like a digest of this algorithm.
    #[must_use]
    pub fn is_valid_hex(self, candidate: &str) -> bool {
        candidate.len() == self.hex_len() && candidate.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl ContentDigest for DigestAlgorithm {
    fn digest(&self, bytes: &[u8]) -> String {
        match self {
            Self::Md5 => hash_to_hex(&Md5::digest(bytes)),
            Self::Sha256 => hash_to_hex(&Sha256::digest(bytes)),
            Self::Blake3 => blake3::hash(bytes).to_hex().to_string(),
            Self::Md5Decimal => hash_to_hex(&Md5::digest(decimal_list(bytes).as_bytes())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
            Self::Md5Decimal => "md5-decimal",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lowercase hex encoding of a digest.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// `[137, 80, 78]` as `"137,80,78"`.
fn decimal_list(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{b}");
    }
    out
}
