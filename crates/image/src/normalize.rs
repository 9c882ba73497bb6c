//! Color normalization: every frame ends up as opaque RGB.
//!
//! The GIF encoder cannot represent partial transparency, so alpha is
//! flattened against a white background instead of being carried along.

use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

/// Background used when flattening transparency.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Convert any decoded image to canonical opaque RGB.
///
/// Images with an alpha channel (including paletted images with a
/// transparent index, which decode to RGBA) are composited onto white.
/// Applying this to its own output returns the same pixels.
pub fn normalize(img: &DynamicImage) -> RgbImage {
    if has_alpha_channel(img) {
        flatten_rgba(&img.to_rgba8(), WHITE)
    } else {
        img.to_rgb8()
    }
}

/// Composite an RGBA buffer over a solid background.
pub fn flatten_rgba(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    let (width, height) = rgba.dimensions();
    let mut output = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        output.put_pixel(
            x,
            y,
            Rgb([
                blend(r, background[0], a),
                blend(g, background[1], a),
                blend(b, background[2], a),
            ]),
        );
    }

    output
}

/// Check if an image carries an alpha channel.
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    let mixed = u32::from(fg) * a + u32::from(bg) * (255 - a);
    // Rounded division by 255; the result never exceeds 255.
    ((mixed + 127) / 255) as u8
}
