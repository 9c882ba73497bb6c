//! Tunables for the pipeline and for text overlays.
//!
//! Both structs deserialize with per-field defaults so a partial TOML table
//! is enough.

use crate::encode::Timing;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Encoding and request limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Loop count forced onto animated output, 0 loops forever.
    /// Unset keeps the source's count.
    #[serde(default)]
    pub loop_count: Option<u16>,

    /// How frame durations are written
    #[serde(default)]
    pub timing: Timing,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// GIF quantizer speed (1 best quality, 30 fastest)
    #[serde(default = "default_gif_speed")]
    pub gif_speed: i32,

    /// Most attachments one request may carry
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,

    /// Largest accepted width or height of a source image
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            loop_count: None,
            timing: Timing::default(),
            jpeg_quality: default_jpeg_quality(),
            gif_speed: default_gif_speed(),
            max_attachments: default_max_attachments(),
            max_dimension: default_max_dimension(),
        }
    }
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_gif_speed() -> i32 {
    10
}

fn default_max_attachments() -> usize {
    10
}

fn default_max_dimension() -> u32 {
    4096
}

/// Look of caption bands and watermark boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// TrueType font to try before the system fonts
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Text height in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Space between text and band edge
    #[serde(default = "default_padding")]
    pub padding: u32,

    /// Distance between watermark box and image corner
    #[serde(default = "default_margin")]
    pub margin: u32,

    /// Band fill color
    #[serde(default = "default_band_color")]
    pub band_color: [u8; 3],

    /// Text color
    #[serde(default = "default_text_color")]
    pub text_color: [u8; 3],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: default_font_size(),
            padding: default_padding(),
            margin: default_margin(),
            band_color: default_band_color(),
            text_color: default_text_color(),
        }
    }
}

fn default_font_size() -> f32 {
    28.0
}

fn default_padding() -> u32 {
    10
}

fn default_margin() -> u32 {
    10
}

fn default_band_color() -> [u8; 3] {
    [0, 0, 0]
}

fn default_text_color() -> [u8; 3] {
    [255, 255, 255]
}
