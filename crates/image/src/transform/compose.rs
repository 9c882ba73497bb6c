//! Transforms that pick or join frames.

use crate::error::TransformError;
use crate::frame::{Frame, FrameSequence};
use image::imageops::{self, FilterType};
use tracing::debug;

/// Keep only the first frame.
pub fn first_frame(sequence: FrameSequence) -> FrameSequence {
    if !sequence.is_animated() {
        return sequence;
    }
    FrameSequence::single(sequence.first().clone()).with_loop_count(sequence.loop_count())
}

/// Join sequences end to end into one animation.
///
/// The output takes its size from the first frame of the first sequence;
/// frames of any other size are resized to match with Lanczos3 filtering.
/// Durations are kept per frame, and the loop count comes from the first
/// sequence.
pub fn combine(sequences: Vec<FrameSequence>) -> Result<FrameSequence, TransformError> {
    let mut sequences = sequences.into_iter();
    let head = sequences.next().ok_or(TransformError::EmptySequence)?;
    let (width, height) = head.dimensions();
    let loop_count = head.loop_count();

    let mut frames = head.into_frames();
    for (index, sequence) in sequences.enumerate() {
        if sequence.dimensions() != (width, height) {
            debug!(
                index = index + 1,
                from = ?sequence.dimensions(),
                to = ?(width, height),
                "Resizing sequence to match"
            );
        }
        frames.extend(
            sequence
                .into_frames()
                .into_iter()
                .map(|frame| fit(frame, width, height)),
        );
    }

    Ok(FrameSequence::new(frames)?.with_loop_count(loop_count))
}

fn fit(frame: Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        return frame;
    }
    frame.map_image(|img| imageops::resize(&img, width, height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, value: u8, delay: u32) -> Frame {
        Frame::new(RgbImage::from_pixel(width, height, Rgb([value, value, value])), delay)
    }

    #[test]
    fn test_first_frame() {
        let seq = FrameSequence::new(vec![solid(4, 4, 10, 30), solid(4, 4, 20, 40)]).unwrap();
        let out = first_frame(seq);
        assert_eq!(out.len(), 1);
        assert_eq!(out.first().image().get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(out.first().delay_ms(), 30);
    }

    #[test]
    fn test_combine_concatenates_in_order() {
        let a = FrameSequence::new(vec![solid(4, 4, 1, 10), solid(4, 4, 2, 20)]).unwrap();
        let b = FrameSequence::single(solid(4, 4, 3, 30));
        let out = combine(vec![a, b]).unwrap();
        let values: Vec<u8> = out.frames().iter().map(|f| f.image().get_pixel(0, 0).0[0]).collect();
        let delays: Vec<u32> = out.frames().iter().map(|f| f.delay_ms()).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(delays, vec![10, 20, 30]);
    }

    #[test]
    fn test_combine_resizes_to_first() {
        let a = FrameSequence::single(solid(8, 6, 50, 100));
        let b = FrameSequence::single(solid(16, 3, 200, 100));
        let out = combine(vec![a, b]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.frames().iter().all(|f| f.dimensions() == (8, 6)));
        // Uniform color survives resampling.
        assert_eq!(out.frames()[1].image().get_pixel(4, 3).0, [200, 200, 200]);
    }

    #[test]
    fn test_combine_keeps_first_loop_count() {
        let a = FrameSequence::single(solid(2, 2, 0, 100)).with_loop_count(5);
        let b = FrameSequence::single(solid(2, 2, 0, 100)).with_loop_count(1);
        assert_eq!(combine(vec![a, b]).unwrap().loop_count(), 5);
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(combine(Vec::new()), Err(TransformError::EmptySequence));
    }
}
