//! Payload metadata: cheap header probing and full sequence inspection.

use crate::detect::{detect_format, SourceFormat};
use crate::error::DecodeError;
use crate::extract::extract;
use serde::{Deserialize, Serialize};

/// What a payload contains once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMetadata {
    /// Detected format
    pub format: SourceFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of frames
    pub frame_count: usize,
    /// Per-frame durations in milliseconds
    pub delays_ms: Vec<u32>,
    /// Sum of all durations
    pub total_duration_ms: u64,
    /// Payload size in bytes
    pub size_bytes: usize,
}

impl SequenceMetadata {
    /// Calculate aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// True when the payload holds more than one frame.
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// Fully decode a payload and describe it.
pub fn inspect(data: &[u8]) -> Result<SequenceMetadata, DecodeError> {
    let format = detect_format(data)?;
    let sequence = extract(data)?;
    let (width, height) = sequence.dimensions();

    Ok(SequenceMetadata {
        format,
        width,
        height,
        frame_count: sequence.len(),
        delays_ms: sequence.frames().iter().map(|f| f.delay_ms()).collect(),
        total_duration_ms: sequence.total_duration_ms(),
        size_bytes: data.len(),
    })
}

/// Read width and height from the header without decoding pixels.
///
/// Returns `None` when the format is not probed this way or the header is
/// damaged; callers then fall back to a full decode.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    match detect_format(data).ok()? {
        SourceFormat::Jpeg => jpeg_dimensions(data),
        SourceFormat::Png => png_dimensions(data),
        SourceFormat::Gif => gif_dimensions(data),
        SourceFormat::Bmp => bmp_dimensions(data),
        SourceFormat::WebP => None,
    }
}

/// Walk JPEG segments until a start-of-frame marker.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;

    while pos + 4 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];

        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            let header = data.get(pos + 5..pos + 9)?;
            let height = u16::from_be_bytes([header[0], header[1]]);
            let width = u16::from_be_bytes([header[2], header[3]]);
            return Some((u32::from(width), u32::from(height)));
        }

        let standalone = marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker);
        if standalone {
            pos += 2;
        } else {
            let length = data.get(pos + 2..pos + 4)?;
            pos += 2 + usize::from(u16::from_be_bytes([length[0], length[1]]));
        }
    }

    None
}

/// IHDR is always the first chunk: width and height follow its tag.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.get(12..16)? != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(data.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(data.get(20..24)?.try_into().ok()?);
    Some((width, height))
}

/// Logical screen size sits right after the six-byte signature.
fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let width = u16::from_le_bytes(data.get(6..8)?.try_into().ok()?);
    let height = u16::from_le_bytes(data.get(8..10)?.try_into().ok()?);
    Some((u32::from(width), u32::from(height)))
}

/// BITMAPINFOHEADER (or later) width/height; height is negative for
/// top-down bitmaps. The 12-byte OS/2 core header is left to the decoder.
fn bmp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let header_size = u32::from_le_bytes(data.get(14..18)?.try_into().ok()?);
    if header_size < 40 {
        return None;
    }
    let width = i32::from_le_bytes(data.get(18..22)?.try_into().ok()?);
    let height = i32::from_le_bytes(data.get(22..26)?.try_into().ok()?);
    Some((width.unsigned_abs(), height.unsigned_abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buffer, format)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_probe_matches_encoders() {
        assert_eq!(probe_dimensions(&encoded(31, 17, ImageOutputFormat::Png)), Some((31, 17)));
        assert_eq!(probe_dimensions(&encoded(31, 17, ImageOutputFormat::Jpeg(80))), Some((31, 17)));
        assert_eq!(probe_dimensions(&encoded(31, 17, ImageOutputFormat::Gif)), Some((31, 17)));
        assert_eq!(probe_dimensions(&encoded(31, 17, ImageOutputFormat::Bmp)), Some((31, 17)));
    }

    #[test]
    fn test_probe_skips_core_bmp_header() {
        // 14-byte file header, then a 12-byte BITMAPCOREHEADER for a 2x3 image.
        let mut data = b"BM".to_vec();
        data.extend_from_slice(&[0; 12]);
        data.extend_from_slice(&12u32.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        assert_eq!(probe_dimensions(&data), None);

        let info = encoded(5, 6, ImageOutputFormat::Bmp);
        assert!(u32::from_le_bytes(info[14..18].try_into().unwrap()) >= 40);
        assert_eq!(probe_dimensions(&info), Some((5, 6)));
    }

    #[test]
    fn test_probe_damaged_header() {
        assert_eq!(probe_dimensions(b"GIF89a\x01"), None);
        assert_eq!(probe_dimensions(b"nope"), None);
    }

    #[test]
    fn test_inspect_still() {
        let meta = inspect(&encoded(40, 20, ImageOutputFormat::Png)).unwrap();
        assert_eq!(meta.format, SourceFormat::Png);
        assert_eq!((meta.width, meta.height), (40, 20));
        assert_eq!(meta.frame_count, 1);
        assert_eq!(meta.delays_ms, vec![100]);
        assert!(!meta.is_animated());
        assert!((meta.aspect_ratio() - 2.0).abs() < f64::EPSILON);
    }
}
