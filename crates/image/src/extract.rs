//! Frame extraction: raw bytes to a fully materialized [`FrameSequence`].

use crate::detect::{detect_format, SourceFormat};
use crate::error::DecodeError;
use crate::frame::{Frame, FrameSequence, DEFAULT_DELAY_MS};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Delay};
use std::io::Cursor;
use tracing::debug;

/// Decode a payload into frames.
///
/// Still images yield one frame lasting [`DEFAULT_DELAY_MS`]. GIF payloads
/// yield every frame in stored order, each composited onto the full canvas
/// and copied into its own buffer, with its declared delay.
pub fn extract(data: &[u8]) -> Result<FrameSequence, DecodeError> {
    let format = detect_format(data)?;
    let sequence = if format.is_animated_container() {
        extract_animation(data, format)?
    } else {
        extract_still(data, format)?
    };

    debug!(
        format = %format,
        frames = sequence.len(),
        width = sequence.dimensions().0,
        height = sequence.dimensions().1,
        "Extracted frames"
    );
    Ok(sequence)
}

fn extract_still(data: &[u8], format: SourceFormat) -> Result<FrameSequence, DecodeError> {
    let img = image::load_from_memory_with_format(data, format.codec())
        .map_err(|source| DecodeError::Image { format, source })?;
    Ok(FrameSequence::single(Frame::from_dynamic(&img, DEFAULT_DELAY_MS)))
}

fn extract_animation(data: &[u8], format: SourceFormat) -> Result<FrameSequence, DecodeError> {
    let decoder =
        GifDecoder::new(Cursor::new(data)).map_err(|source| DecodeError::Image { format, source })?;
    let decoded = decoder
        .into_frames()
        .collect_frames()
        .map_err(|source| DecodeError::Image { format, source })?;

    let frames: Vec<Frame> = decoded
        .into_iter()
        .map(|frame| {
            let delay = delay_ms(frame.delay());
            Frame::from_rgba(frame.buffer(), delay)
        })
        .collect();

    // The decoder composites onto a fixed canvas, so a size mismatch here
    // can only mean an empty container.
    let sequence = FrameSequence::new(frames).map_err(|_| DecodeError::NoFrames(format))?;
    Ok(match gif_loop_count(data) {
        Some(loop_count) => sequence.with_loop_count(loop_count),
        None => sequence,
    })
}

/// Loop count stored in the NETSCAPE2.0 (or ANIMEXTS1.0) application block.
///
/// The codec does not expose it, so the 19-byte block is matched directly:
/// introducer, label, size 11, application name, sub-block `03 01`, the
/// little-endian count and a terminator. `None` when the block is absent.
pub fn gif_loop_count(data: &[u8]) -> Option<u16> {
    const LOOP_APPS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

    data.windows(19)
        .find(|block| {
            block[..3] == [0x21_u8, 0xFF, 0x0B]
                && LOOP_APPS.contains(&&block[3..14])
                && block[14..16] == [0x03_u8, 0x01]
        })
        .map(|block| u16::from_le_bytes([block[16], block[17]]))
}

/// Convert a codec delay to whole milliseconds; zero means "not declared".
pub(crate) fn delay_ms(delay: Delay) -> u32 {
    let (numer, denom) = delay.numer_denom_ms();
    if numer == 0 || denom == 0 {
        return DEFAULT_DELAY_MS;
    }
    let ms = (f64::from(numer) / f64::from(denom)).round();
    (ms as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageOutputFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn gif_bytes(delays_ms: &[u32]) -> Vec<u8> {
        gif_bytes_repeating(delays_ms, Repeat::Infinite)
    }

    fn gif_bytes_repeating(delays_ms: &[u32], repeat: Repeat) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            encoder.set_repeat(repeat).unwrap();
            for (i, delay) in delays_ms.iter().enumerate() {
                let shade = (i as u8).wrapping_mul(60);
                let canvas = RgbaImage::from_pixel(6, 4, Rgba([shade, 0, 0, 255]));
                let frame = image::Frame::from_parts(
                    canvas,
                    0,
                    0,
                    Delay::from_numer_denom_ms(*delay, 1),
                );
                encoder.encode_frame(frame).unwrap();
            }
        }
        bytes
    }

    #[test]
    fn test_still_png_has_one_default_frame() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(5, 3));
        let seq = extract(&png_bytes(img)).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.dimensions(), (5, 3));
        assert_eq!(seq.first().delay_ms(), DEFAULT_DELAY_MS);
    }

    #[test]
    fn test_transparent_png_is_flattened() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let seq = extract(&png_bytes(img)).unwrap();
        assert_eq!(seq.first().image().get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_gif_frames_keep_order_and_delays() {
        let seq = extract(&gif_bytes(&[100, 200, 50])).unwrap();
        assert_eq!(seq.len(), 3);
        let delays: Vec<u32> = seq.frames().iter().map(Frame::delay_ms).collect();
        assert_eq!(delays, vec![100, 200, 50]);

        let reds: Vec<u8> = seq
            .frames()
            .iter()
            .map(|f| f.image().get_pixel(0, 0)[0])
            .collect();
        assert!(reds[0] < reds[1] && reds[1] < reds[2]);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(matches!(
            extract(b"definitely not an image"),
            Err(DecodeError::UnknownFormat)
        ));
    }

    #[test]
    fn test_truncated_png_reports_codec_error() {
        let mut data = png_bytes(DynamicImage::ImageRgb8(image::RgbImage::new(8, 8)));
        data.truncate(20);
        assert!(matches!(
            extract(&data),
            Err(DecodeError::Image { format: SourceFormat::Png, .. })
        ));
    }

    #[test]
    fn test_zero_delay_means_default() {
        assert_eq!(delay_ms(Delay::from_numer_denom_ms(0, 1)), DEFAULT_DELAY_MS);
        assert_eq!(delay_ms(Delay::from_numer_denom_ms(70, 1)), 70);
    }

    #[test]
    fn test_loop_count_is_read_from_source() {
        let finite = extract(&gif_bytes_repeating(&[100, 100], Repeat::Finite(3))).unwrap();
        assert_eq!(finite.loop_count(), 3);
        let forever = extract(&gif_bytes(&[100, 100])).unwrap();
        assert_eq!(forever.loop_count(), 0);
    }

    #[test]
    fn test_loop_block_parsing() {
        let mut data = b"GIF89a".to_vec();
        assert_eq!(gif_loop_count(&data), None);
        data.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        data.extend_from_slice(b"NETSCAPE2.0");
        data.extend_from_slice(&[0x03, 0x01, 0x05, 0x01, 0x00]);
        assert_eq!(gif_loop_count(&data), Some(261));
    }
}
