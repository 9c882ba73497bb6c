//! Caption bands and watermark boxes.

use crate::error::TransformError;
use crate::font::{Region, Typeface};
use crate::frame::FrameSequence;
use crate::settings::OverlayStyle;
use image::RgbImage;

/// Draw `text` centered in a solid band across the bottom of every frame.
///
/// The band is as tall as the text plus `padding` above and below, capped
/// at the frame height. Pixels above the band are left untouched.
pub fn caption(
    sequence: FrameSequence,
    text: &str,
    typeface: &Typeface,
    style: &OverlayStyle,
) -> Result<FrameSequence, TransformError> {
    sequence.map_frames(|frame| frame.map_image(|mut img| {
        draw_caption(&mut img, text, typeface, style);
        img
    }))
}

/// Draw `text` in a box anchored to the bottom-right corner of every frame.
pub fn watermark(
    sequence: FrameSequence,
    text: &str,
    typeface: &Typeface,
    style: &OverlayStyle,
) -> Result<FrameSequence, TransformError> {
    sequence.map_frames(|frame| frame.map_image(|mut img| {
        draw_watermark(&mut img, text, typeface, style);
        img
    }))
}

/// Region the caption band occupies on a `width`×`height` frame.
pub fn caption_band(width: u32, height: u32, text: &str, typeface: &Typeface, style: &OverlayStyle) -> Region {
    let extent = typeface.measure(text);
    let band_height = extent
        .height
        .saturating_add(style.padding.saturating_mul(2))
        .min(height);
    Region {
        x: 0,
        y: height - band_height,
        width,
        height: band_height,
    }
}

/// Region the watermark box occupies on a `width`×`height` frame.
pub fn watermark_box(width: u32, height: u32, text: &str, typeface: &Typeface, style: &OverlayStyle) -> Region {
    let extent = typeface.measure(text);
    let padding = style.padding.saturating_mul(2);
    let box_width = extent.width.saturating_add(padding).min(width);
    let box_height = extent.height.saturating_add(padding).min(height);
    Region {
        x: width.saturating_sub(box_width.saturating_add(style.margin)),
        y: height.saturating_sub(box_height.saturating_add(style.margin)),
        width: box_width,
        height: box_height,
    }
}

fn draw_caption(img: &mut RgbImage, text: &str, typeface: &Typeface, style: &OverlayStyle) {
    let (width, height) = img.dimensions();
    let band = caption_band(width, height, text, typeface, style);
    band.fill(img, style.band_color);
    draw_centered(img, band, text, typeface, style.text_color);
}

fn draw_watermark(img: &mut RgbImage, text: &str, typeface: &Typeface, style: &OverlayStyle) {
    let (width, height) = img.dimensions();
    let region = watermark_box(width, height, text, typeface, style);
    region.fill(img, style.band_color);
    draw_centered(img, region, text, typeface, style.text_color);
}

fn draw_centered(img: &mut RgbImage, region: Region, text: &str, typeface: &Typeface, color: [u8; 3]) {
    let extent = typeface.measure(text);
    let x = i64::from(region.x) + (i64::from(region.width) - i64::from(extent.width)) / 2;
    let y = i64::from(region.y) + (i64::from(region.height) - i64::from(extent.height)) / 2;
    typeface.draw(img, (x, y), text, color, region);
}
