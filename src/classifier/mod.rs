//! Keep/delete decisions for individual image files.
//!
//! # Overview
//!
//! Every file in the target folder gets exactly one [`Verdict`]. The decision
//! is taken by [`Classifier::classify`] from the file size and its raw bytes:
//!
//! 1. **Small files** (`size < 30000` bytes) are assumed to be placeholder or
//!    broken-image artifacts. Their content digest is compared against the
//!    known-bad list; a match yields `Delete("not_found.jpg")`.
//! 2. **Large files** are decoded just far enough to read their dimensions.
//!    Anything narrower or shorter than the configured minimum yields
//!    `Delete("too_small: [WxH]")`.
//!
//! The two checks never overlap: small files are never decoded and large files
//! are never hashed.
//!
//! The digest and the dimension decoder are capabilities ([`ContentDigest`]
//! and [`DimensionProbe`]) so the rules can be exercised without real images.
//!
//! # Example
//!
//! ```
//! use pixel_mage::classifier::{Classifier, ClassifierRules, DigestAlgorithm, ImageProbe, Verdict};
//!
//! let rules = ClassifierRules::new(1920, 1080);
//! let classifier = Classifier::new(rules, Box::new(DigestAlgorithm::Md5), Box::new(ImageProbe));
//!
//! // A tiny file that is not on the known-bad list is kept.
//! assert_eq!(classifier.classify(3, b"abc").unwrap(), Verdict::Keep);
//! ```

pub mod digest;
pub mod probe;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use digest::{hash_to_hex, ContentDigest, DigestAlgorithm};
pub use probe::{Dimensions, DimensionProbe, ImageProbe, ProbeError};

/// Files strictly below this size are hash-checked, everything else is
/// dimension-checked.
pub const SMALL_FILE_THRESHOLD: u64 = 30_000;

/// Delete reason attached to files matching a known-bad digest.
pub const NOT_FOUND_REASON: &str = "not_found.jpg";

/// The keep/delete decision for one file.
///
/// On disk a verdict is a plain string: empty means keep, anything else is the
/// human-readable reason for deleting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    /// Leave the file alone.
    Keep,
    /// Remove the file, with the reason shown in logs.
    Delete(String),
}

impl Verdict {
    /// Verdict for a placeholder image matched by digest.
    #[must_use]
    pub fn not_found() -> Self {
        Self::Delete(NOT_FOUND_REASON.to_string())
    }

    /// Verdict for an image below the dimension thresholds.
    #[must_use]
    pub fn too_small(dimensions: Dimensions) -> Self {
        Self::Delete(format!("too_small: [{dimensions}]"))
    }

    /// Whether the file should be removed.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete(_))
    }

    /// The on-disk representation (`""` for keep).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Keep => "",
            Self::Delete(reason) => reason,
        }
    }

    /// The delete reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Keep => None,
            Self::Delete(reason) => Some(reason),
        }
    }
}

impl From<String> for Verdict {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Keep
        } else {
            Self::Delete(value)
        }
    }
}

impl From<&str> for Verdict {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Verdict> for String {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::Keep => String::new(),
            Verdict::Delete(reason) => reason,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Delete(reason) => write!(f, "delete ({reason})"),
        }
    }
}

/// Thresholds and the known-bad digest list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRules {
    /// Minimum accepted width in pixels.
    pub min_width: u32,
    /// Minimum accepted height in pixels.
    pub min_height: u32,
    /// Lowercase hex digests of placeholder images.
    pub known_bad_hashes: HashSet<String>,
}

impl ClassifierRules {
    /// Rules with the given thresholds and an empty known-bad list.
    #[must_use]
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
            known_bad_hashes: HashSet::new(),
        }
    }

    /// Add known-bad digests. Comparison is case-insensitive.
    #[must_use]
    pub fn with_known_bad_hashes<I, S>(mut self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_bad_hashes
            .extend(hashes.into_iter().map(|h| h.as_ref().trim().to_ascii_lowercase()));
        self
    }

    /// Whether `dimensions` falls below either threshold.
    #[must_use]
    pub fn is_too_small(&self, dimensions: Dimensions) -> bool {
        dimensions.width < self.min_width || dimensions.height < self.min_height
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// A file could not be classified.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The image header could not be decoded.
    #[error("could not read image dimensions: {0}")]
    Dimensions(#[from] ProbeError),
}

/// Applies [`ClassifierRules`] using injected digest and decoding capabilities.
pub struct Classifier {
    rules: ClassifierRules,
    digest: Box<dyn ContentDigest>,
    probe: Box<dyn DimensionProbe>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules)
            .field("digest", &self.digest.name())
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Create a classifier from rules and capabilities.
    #[must_use]
    pub fn new(
        rules: ClassifierRules,
        digest: Box<dyn ContentDigest>,
        probe: Box<dyn DimensionProbe>,
    ) -> Self {
        Self {
            rules,
            digest,
            probe,
        }
    }

    /// The rules this classifier applies.
    #[must_use]
    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Decide what to do with a file of `size` bytes whose content is `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Dimensions`] when a large file cannot be
    /// decoded. Small files never fail.
    pub fn classify(&self, size: u64, bytes: &[u8]) -> Result<Verdict, ClassifyError> {
        if size < SMALL_FILE_THRESHOLD {
            let digest = self.digest.digest(bytes);
            if self.rules.known_bad_hashes.contains(&digest) {
                log::trace!("{} digest {} is on the known-bad list", self.digest.name(), digest);
                return Ok(Verdict::not_found());
            }
            return Ok(Verdict::Keep);
        }

        let dimensions = self.probe.dimensions(bytes)?;
        if self.rules.is_too_small(dimensions) {
            Ok(Verdict::too_small(dimensions))
        } else {
            Ok(Verdict::Keep)
        }
    }
}
