//! Encoder: a [`FrameSequence`] back to bytes.

use crate::error::EncodeError;
use crate::frame::FrameSequence;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, ImageOutputFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use tracing::debug;

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// GIF, static or animated
    #[default]
    Gif,
    /// JPEG, single frame only
    Jpeg,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "image/gif",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// True when the container can hold more than one frame.
    pub fn supports_animation(&self) -> bool {
        matches!(self, OutputFormat::Gif)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Gif => write!(f, "GIF"),
            OutputFormat::Jpeg => write!(f, "JPEG"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(OutputFormat::Gif),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            other => Err(EncodeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// How frame durations are written to an animated GIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timing {
    /// Each frame keeps its own duration
    #[default]
    PerFrame,
    /// Every frame shows for the rounded mean duration
    Uniform,
}

/// Encoder knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// Duration handling for animations
    pub timing: Timing,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// GIF quantizer speed (1-30)
    pub gif_speed: i32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            timing: Timing::PerFrame,
            jpeg_quality: 90,
            gif_speed: 10,
        }
    }
}

/// Encode `sequence` as `format`.
///
/// A single frame is written as a still image. Several frames are only
/// accepted for GIF, where every frame is written in order together with
/// the sequence loop count.
pub fn encode(sequence: &FrameSequence, format: OutputFormat, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    check_dimensions(sequence)?;

    let bytes = if sequence.is_animated() {
        if !format.supports_animation() {
            return Err(EncodeError::MultiFrameUnsupported {
                format,
                frames: sequence.len(),
            });
        }
        encode_animation(sequence, options)?
    } else {
        encode_still(sequence, format, options)?
    };

    debug!(
        format = %format,
        frames = sequence.len(),
        bytes = bytes.len(),
        "Encoded sequence"
    );
    Ok(bytes)
}

fn check_dimensions(sequence: &FrameSequence) -> Result<(), EncodeError> {
    let expected = sequence.dimensions();
    match sequence
        .frames()
        .iter()
        .position(|frame| frame.dimensions() != expected)
    {
        Some(index) => Err(EncodeError::DimensionMismatch {
            index,
            expected,
            found: sequence.frames()[index].dimensions(),
        }),
        None => Ok(()),
    }
}

fn encode_still(sequence: &FrameSequence, format: OutputFormat, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let output_format = match format {
        OutputFormat::Gif => ImageOutputFormat::Gif,
        OutputFormat::Jpeg => ImageOutputFormat::Jpeg(options.jpeg_quality.clamp(1, 100)),
    };

    let img = DynamicImage::ImageRgb8(sequence.first().image().clone());
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, output_format)
        .map_err(|source| EncodeError::Image { format, source })?;
    Ok(buffer.into_inner())
}

fn encode_animation(sequence: &FrameSequence, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let format = OutputFormat::Gif;
    let uniform = sequence.mean_delay_ms();
    let repeat = match sequence.loop_count() {
        0 => Repeat::Infinite,
        n => Repeat::Finite(n),
    };

    let mut bytes = Vec::new();
    {
        // The trailer is written when the encoder drops.
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, options.gif_speed.clamp(1, 30));
        encoder
            .set_repeat(repeat)
            .map_err(|source| EncodeError::Image { format, source })?;

        for frame in sequence.frames() {
            let delay = match options.timing {
                Timing::PerFrame => frame.delay_ms(),
                Timing::Uniform => uniform,
            };
            let rgba = DynamicImage::ImageRgb8(frame.image().clone()).into_rgba8();
            encoder
                .encode_frame(to_gif_frame(rgba, delay))
                .map_err(|source| EncodeError::Image { format, source })?;
        }
    }
    Ok(bytes)
}

fn to_gif_frame(rgba: RgbaImage, delay_ms: u32) -> image::Frame {
    image::Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(gif_delay_ms(delay_ms), 1))
}

/// GIF stores delays in whole centiseconds and the codec truncates, so
/// round to the nearest one here, never below 10 ms.
fn gif_delay_ms(delay_ms: u32) -> u32 {
    (delay_ms.saturating_add(5) / 10).max(1) * 10
}
