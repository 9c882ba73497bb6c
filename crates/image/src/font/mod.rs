//! Text rendering for overlays.
//!
//! A [`Typeface`] is either a scalable TrueType font or the built-in bitmap
//! font. [`Typeface::load`] tries the TrueType route first and falls back
//! explicitly when no usable font file exists, so text overlays always work.

mod bitmap;

use image::{Rgb, RgbImage};
use std::fmt;
use std::path::Path;
use tracing::warn;

#[cfg(feature = "truetype")]
use rusttype::{point, Font, Scale};

/// Well-known font locations tried after the configured path.
#[cfg(feature = "truetype")]
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "arial.ttf",
];

/// Pixel size of rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Region {
    /// Whether the pixel `(x, y)` lies inside.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= i64::from(self.x)
            && y >= i64::from(self.y)
            && x < i64::from(self.x) + i64::from(self.width)
            && y < i64::from(self.y) + i64::from(self.height)
    }

    /// Paint every pixel of the region that lies on the canvas.
    pub fn fill(&self, canvas: &mut RgbImage, color: [u8; 3]) {
        let x_end = self.x.saturating_add(self.width).min(canvas.width());
        let y_end = self.y.saturating_add(self.height).min(canvas.height());
        for y in self.y..y_end {
            for x in self.x..x_end {
                canvas.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

/// A font ready to measure and draw text.
#[derive(Clone)]
pub enum Typeface {
    /// TrueType font rendered at `size` pixels
    #[cfg(feature = "truetype")]
    Scalable {
        /// Parsed font
        font: Font<'static>,
        /// Pixel height
        size: f32,
    },
    /// Built-in 5x7 font, each font unit drawn as a `scale`×`scale` block
    Bitmap {
        /// Block size
        scale: u32,
    },
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "truetype")]
            Typeface::Scalable { size, .. } => f.debug_struct("Scalable").field("size", size).finish(),
            Typeface::Bitmap { scale } => f.debug_struct("Bitmap").field("scale", scale).finish(),
        }
    }
}

impl Typeface {
    /// Load the best available typeface for `size` pixel text.
    ///
    /// Tries `font_path`, then common system fonts; if none parses, returns
    /// the bitmap font at the closest scale.
    pub fn load(font_path: Option<&Path>, size: f32) -> Self {
        #[cfg(feature = "truetype")]
        {
            let candidates = font_path
                .into_iter()
                .chain(SYSTEM_FONTS.iter().map(Path::new));
            for path in candidates {
                if let Some(face) = Self::from_file(path, size) {
                    tracing::debug!(path = %path.display(), size, "Loaded TrueType font");
                    return face;
                }
            }
            warn!(size, "No TrueType font available, using built-in bitmap font");
        }

        #[cfg(not(feature = "truetype"))]
        {
            if let Some(path) = font_path {
                warn!(path = %path.display(), "TrueType support disabled, using built-in bitmap font");
            }
        }

        Self::bitmap(size)
    }

    /// Read and parse a TrueType file.
    #[cfg(feature = "truetype")]
    pub fn from_file(path: &Path, size: f32) -> Option<Self> {
        let data = std::fs::read(path).ok()?;
        Self::from_bytes(data, size)
    }

    /// Parse TrueType data already in memory.
    #[cfg(feature = "truetype")]
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Option<Self> {
        Font::try_from_vec(data).map(|font| Typeface::Scalable { font, size })
    }

    /// The built-in font sized as close to `size` pixels as whole blocks allow.
    pub fn bitmap(size: f32) -> Self {
        let scale = (size / bitmap::GLYPH_HEIGHT as f32).round();
        let scale = if scale.is_finite() && scale >= 1.0 { scale as u32 } else { 1 };
        Typeface::Bitmap { scale }
    }

    /// True for a TrueType font.
    pub fn is_scalable(&self) -> bool {
        !matches!(self, Typeface::Bitmap { .. })
    }

    /// Pixel size `text` occupies when drawn.
    pub fn measure(&self, text: &str) -> TextExtent {
        match self {
            #[cfg(feature = "truetype")]
            Typeface::Scalable { font, size } => {
                let scale = Scale::uniform(*size);
                let v_metrics = font.v_metrics(scale);
                let width = font
                    .layout(text, scale, point(0.0, v_metrics.ascent))
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .fold(0.0_f32, f32::max);
                TextExtent {
                    width: width.ceil() as u32,
                    height: (v_metrics.ascent - v_metrics.descent).ceil() as u32,
                }
            }
            Typeface::Bitmap { scale } => {
                let count = text.chars().count() as u32;
                let advance = (bitmap::GLYPH_WIDTH + bitmap::GLYPH_SPACING) * scale;
                TextExtent {
                    width: (count * advance).saturating_sub(bitmap::GLYPH_SPACING * scale),
                    height: bitmap::GLYPH_HEIGHT * scale,
                }
            }
        }
    }

    /// Draw `text` with its top-left corner at `origin`.
    ///
    /// Only pixels inside `clip` (and on the canvas) are touched.
    pub fn draw(&self, canvas: &mut RgbImage, origin: (i64, i64), text: &str, color: [u8; 3], clip: Region) {
        let (ox, oy) = origin;
        match self {
            #[cfg(feature = "truetype")]
            Typeface::Scalable { font, size } => {
                let scale = Scale::uniform(*size);
                let v_metrics = font.v_metrics(scale);
                let start = point(ox as f32, oy as f32 + v_metrics.ascent);
                for glyph in font.layout(text, scale, start) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        let px = i64::from(bb.min.x) + i64::from(gx);
                        let py = i64::from(bb.min.y) + i64::from(gy);
                        blend_pixel(canvas, clip, px, py, color, coverage);
                    });
                }
            }
            Typeface::Bitmap { scale } => {
                let scale = i64::from(*scale);
                let advance = i64::from(bitmap::GLYPH_WIDTH + bitmap::GLYPH_SPACING) * scale;
                for (i, c) in text.chars().enumerate() {
                    let rows = bitmap::glyph(c);
                    let gx = ox + i as i64 * advance;
                    for row in 0..bitmap::GLYPH_HEIGHT {
                        for col in 0..bitmap::GLYPH_WIDTH {
                            if !bitmap::is_set(&rows, col, row) {
                                continue;
                            }
                            for dy in 0..scale {
                                for dx in 0..scale {
                                    let px = gx + i64::from(col) * scale + dx;
                                    let py = oy + i64::from(row) * scale + dy;
                                    blend_pixel(canvas, clip, px, py, color, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn blend_pixel(canvas: &mut RgbImage, clip: Region, x: i64, y: i64, color: [u8; 3], coverage: f32) {
    if coverage <= 0.0 || !clip.contains(x, y) {
        return;
    }
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let coverage = coverage.min(1.0);
    let pixel = canvas.get_pixel_mut(x, y);
    for (channel, target) in pixel.0.iter_mut().zip(color) {
        let mixed = f32::from(*channel) * (1.0 - coverage) + f32::from(target) * coverage;
        *channel = mixed.round() as u8;
    }
}
