//! Input format detection from magic bytes and filename extensions.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Formats accepted as pipeline input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image, possibly animated
    Gif,
    /// WebP image
    WebP,
    /// BMP image
    Bmp,
}

/// Every extension the request adapter lets through, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

impl SourceFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::Gif => "image/gif",
            SourceFormat::WebP => "image/webp",
            SourceFormat::Bmp => "image/bmp",
        }
    }

    /// Get common file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Jpeg => &["jpg", "jpeg"],
            SourceFormat::Png => &["png"],
            SourceFormat::Gif => &["gif"],
            SourceFormat::WebP => &["webp"],
            SourceFormat::Bmp => &["bmp"],
        }
    }

    /// Whether payloads of this format may carry more than one frame.
    pub fn is_animated_container(&self) -> bool {
        matches!(self, SourceFormat::Gif)
    }

    /// Resolve a format from a filename, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "gif" => Some(SourceFormat::Gif),
            "webp" => Some(SourceFormat::WebP),
            "bmp" => Some(SourceFormat::Bmp),
            _ => None,
        }
    }

    pub(crate) fn codec(&self) -> image::ImageFormat {
        match self {
            SourceFormat::Jpeg => image::ImageFormat::Jpeg,
            SourceFormat::Png => image::ImageFormat::Png,
            SourceFormat::Gif => image::ImageFormat::Gif,
            SourceFormat::WebP => image::ImageFormat::WebP,
            SourceFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Jpeg => "JPEG",
            SourceFormat::Png => "PNG",
            SourceFormat::Gif => "GIF",
            SourceFormat::WebP => "WebP",
            SourceFormat::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

/// Detect the input format from magic bytes.
///
/// # Example
/// ```
/// use gifsmith_image::{detect_format, SourceFormat};
///
/// let gif = b"GIF89a\x01\x00\x01\x00";
/// assert_eq!(detect_format(gif).unwrap(), SourceFormat::Gif);
///
/// let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// assert_eq!(detect_format(&png).unwrap(), SourceFormat::Png);
/// ```
pub fn detect_format(data: &[u8]) -> Result<SourceFormat, DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::Truncated(data.len()));
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(SourceFormat::Jpeg);
    }

    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(SourceFormat::Png);
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(SourceFormat::Gif);
    }

    // RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(SourceFormat::WebP);
    }

    if data.starts_with(b"BM") {
        return Ok(SourceFormat::Bmp);
    }

    Err(DecodeError::UnknownFormat)
}
