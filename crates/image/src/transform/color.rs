//! Color transforms.

use crate::error::TransformError;
use crate::frame::FrameSequence;
use image::{imageops, DynamicImage, RgbImage};

/// Convert every frame to grayscale, keeping the RGB layout.
///
/// Uses the Rec. 709 luma weights `image` applies.
pub fn grayscale(sequence: FrameSequence) -> Result<FrameSequence, TransformError> {
    sequence.map_frames(|frame| frame.map_image(to_gray))
}

fn to_gray(img: RgbImage) -> RgbImage {
    DynamicImage::ImageLuma8(imageops::grayscale(&img)).into_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use image::Rgb;

    #[test]
    fn test_grayscale_equalizes_channels() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 200]));
        let seq = FrameSequence::new(vec![Frame::new(img.clone(), 70), Frame::new(img, 30)]).unwrap();
        let out = grayscale(seq).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out.frames()[0].delay_ms(), 70);
        assert_eq!(out.frames()[1].delay_ms(), 30);
        for frame in out.frames() {
            for p in frame.image().pixels() {
                assert_eq!(p.0[0], p.0[1]);
                assert_eq!(p.0[1], p.0[2]);
            }
        }
    }

    #[test]
    fn test_grayscale_keeps_black_and_white() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        let out = grayscale(FrameSequence::single(Frame::still(img))).unwrap();
        assert_eq!(out.first().image().get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.first().image().get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_grayscale_is_idempotent() {
        let img = RgbImage::from_fn(5, 5, |x, y| Rgb([(x * 50) as u8, 90, (y * 40) as u8]));
        let once = grayscale(FrameSequence::single(Frame::still(img))).unwrap();
        let twice = grayscale(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
