//! Image dimension decoding.

use std::fmt;
use std::io::Cursor;

use image::ImageReader;
use thiserror::Error;

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions pair.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors that can occur while reading image dimensions.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The bytes do not start with a recognised image signature.
    #[error("unrecognised image format")]
    UnknownFormat,

    /// The format was recognised but the header could not be decoded.
    #[error("failed to decode image header: {0}")]
    Decode(#[from] image::ImageError),

    /// Reading from the in-memory buffer failed.
    #[error("failed to read image data: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads image dimensions from raw bytes.
pub trait DimensionProbe {
    /// Decode the dimensions of the image held in `bytes`.
    ///
    /// # Errors
    ///
    /// Fails when the bytes are not a decodable image.
    fn dimensions(&self, bytes: &[u8]) -> Result<Dimensions, ProbeError>;
}

/// [`DimensionProbe`] backed by the `image` crate.
///
/// Only the header is decoded; pixel data is never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProbe;

impl DimensionProbe for ImageProbe {
    fn dimensions(&self, bytes: &[u8]) -> Result<Dimensions, ProbeError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(ProbeError::UnknownFormat);
        }
        let (width, height) = reader.into_dimensions()?;
        Ok(Dimensions::new(width, height))
    }
}
