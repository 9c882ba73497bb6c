//! Frames and frame sequences.
//!
//! A [`Frame`] owns its pixels outright; nothing in the pipeline aliases a
//! decoder buffer. A [`FrameSequence`] is never empty and all of its frames
//! share one size, so a sequence of one frame is simply a still image.

use crate::error::TransformError;
use crate::normalize::{flatten_rgba, normalize};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Display duration used when the source does not declare one.
pub const DEFAULT_DELAY_MS: u32 = 100;

/// Shortest duration a frame may be given by a transform.
pub const MIN_DELAY_MS: u32 = 10;

/// One opaque RGB bitmap plus how long it stays on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
    delay_ms: u32,
}

impl Frame {
    /// Wrap an RGB buffer with an explicit duration.
    pub fn new(image: RgbImage, delay_ms: u32) -> Self {
        Self { image, delay_ms }
    }

    /// Wrap an RGB buffer with the default duration.
    pub fn still(image: RgbImage) -> Self {
        Self::new(image, DEFAULT_DELAY_MS)
    }

    /// Build a frame from any decoded image, flattening transparency.
    pub fn from_dynamic(image: &DynamicImage, delay_ms: u32) -> Self {
        Self::new(normalize(image), delay_ms)
    }

    /// Build a frame from an RGBA canvas, flattening transparency.
    pub fn from_rgba(image: &RgbaImage, delay_ms: u32) -> Self {
        Self::new(flatten_rgba(image, crate::normalize::WHITE), delay_ms)
    }

    /// Pixel buffer.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Take the pixel buffer.
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Display duration in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Same pixels, different duration.
    #[must_use]
    pub fn with_delay(self, delay_ms: u32) -> Self {
        Self { delay_ms, ..self }
    }

    /// Same duration, pixels replaced by `f`.
    #[must_use]
    pub fn map_image(self, f: impl FnOnce(RgbImage) -> RgbImage) -> Self {
        Self {
            image: f(self.image),
            delay_ms: self.delay_ms,
        }
    }
}

/// Ordered, non-empty list of equally sized frames plus a loop count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    loop_count: u16,
}

#[allow(clippy::len_without_is_empty)]
impl FrameSequence {
    /// Build a sequence, checking it is non-empty and uniformly sized.
    pub fn new(frames: Vec<Frame>) -> Result<Self, TransformError> {
        let first = frames.first().ok_or(TransformError::EmptySequence)?;
        let expected = first.dimensions();
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != expected)
        {
            return Err(TransformError::DimensionMismatch {
                index,
                expected,
                found: frame.dimensions(),
            });
        }
        Ok(Self {
            frames,
            loop_count: 0,
        })
    }

    /// A still image.
    pub fn single(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
            loop_count: 0,
        }
    }

    /// Frames in display order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Take the frames.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Number of frames, always at least one.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True for more than one frame.
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// First frame.
    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }

    /// Shared width and height.
    pub fn dimensions(&self) -> (u32, u32) {
        self.first().dimensions()
    }

    /// Loop count for animated output, 0 means forever.
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    /// Set the loop count.
    #[must_use]
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Sum of all frame durations.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.delay_ms())).sum()
    }

    /// Arithmetic mean of frame durations, rounded to the nearest millisecond.
    pub fn mean_delay_ms(&self) -> u32 {
        let count = self.frames.len() as u64;
        let mean = (self.total_duration_ms() + count / 2) / count;
        u32::try_from(mean).unwrap_or(u32::MAX)
    }

    /// Replace the frame list, keeping the loop count.
    ///
    /// The new list goes through the same checks as [`FrameSequence::new`].
    pub fn with_frames(&self, frames: Vec<Frame>) -> Result<Self, TransformError> {
        Ok(Self::new(frames)?.with_loop_count(self.loop_count))
    }

    /// Apply `f` to every frame, preserving order.
    ///
    /// With the `parallel` feature frames are processed on the rayon pool.
    pub fn map_frames<F>(self, f: F) -> Result<Self, TransformError>
    where
        F: Fn(Frame) -> Frame + Send + Sync,
    {
        let loop_count = self.loop_count;

        #[cfg(feature = "parallel")]
        let frames: Vec<Frame> = {
            use rayon::prelude::*;
            self.frames.into_par_iter().map(f).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let frames: Vec<Frame> = self.frames.into_iter().map(f).collect();

        Ok(Self::new(frames)?.with_loop_count(loop_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(w: u32, h: u32, value: u8, delay: u32) -> Frame {
        Frame::new(RgbImage::from_pixel(w, h, Rgb([value, value, value])), delay)
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert_eq!(FrameSequence::new(vec![]), Err(TransformError::EmptySequence));
    }

    #[test]
    fn test_mismatched_frame_rejected() {
        let result = FrameSequence::new(vec![solid(4, 4, 0, 100), solid(4, 3, 0, 100)]);
        assert_eq!(
            result,
            Err(TransformError::DimensionMismatch {
                index: 1,
                expected: (4, 4),
                found: (4, 3),
            })
        );
    }

    #[test]
    fn test_still_defaults() {
        let seq = FrameSequence::single(Frame::still(RgbImage::new(3, 2)));
        assert_eq!(seq.len(), 1);
        assert!(!seq.is_animated());
        assert_eq!(seq.first().delay_ms(), DEFAULT_DELAY_MS);
        assert_eq!(seq.dimensions(), (3, 2));
        assert_eq!(seq.loop_count(), 0);
    }

    #[test]
    fn test_mean_delay_rounds_to_nearest() {
        let seq = FrameSequence::new(vec![
            solid(1, 1, 0, 10),
            solid(1, 1, 0, 20),
            solid(1, 1, 0, 25),
        ])
        .unwrap();
        // 55 / 3 = 18.33
        assert_eq!(seq.mean_delay_ms(), 18);
        assert_eq!(seq.total_duration_ms(), 55);

        let seq = FrameSequence::new(vec![solid(1, 1, 0, 10), solid(1, 1, 0, 15)]).unwrap();
        // 12.5 rounds up
        assert_eq!(seq.mean_delay_ms(), 13);
    }

    #[test]
    fn test_map_frames_keeps_order_and_loop() {
        let seq = FrameSequence::new((0..5).map(|i| solid(2, 2, i * 10, 100)).collect())
            .unwrap()
            .with_loop_count(3);
        let mapped = seq
            .map_frames(|f| {
                let d = u32::from(f.image().get_pixel(0, 0)[0]);
                f.with_delay(d + 10)
            })
            .unwrap();
        let delays: Vec<u32> = mapped.frames().iter().map(Frame::delay_ms).collect();
        assert_eq!(delays, vec![10, 20, 30, 40, 50]);
        assert_eq!(mapped.loop_count(), 3);
    }
}
