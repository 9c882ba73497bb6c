//! Transforms that reorder frames or change how long they show.

use crate::error::TransformError;
use crate::frame::{FrameSequence, MIN_DELAY_MS};

/// Rescale every frame duration by `1 / factor`.
///
/// `factor > 1` plays faster. Durations round to the nearest millisecond
/// and never drop below [`MIN_DELAY_MS`], which is the shortest delay
/// browsers honor. A still image is returned as is.
pub fn speed(sequence: FrameSequence, factor: f64) -> Result<FrameSequence, TransformError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(TransformError::InvalidFactor(factor));
    }
    if !sequence.is_animated() {
        return Ok(sequence);
    }
    sequence.map_frames(|frame| {
        let delay = rescale(frame.delay_ms(), factor);
        frame.with_delay(delay)
    })
}

fn rescale(delay_ms: u32, factor: f64) -> u32 {
    let scaled = (f64::from(delay_ms) / factor).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(MIN_DELAY_MS)
    }
}

/// Play the frames backwards. Each frame keeps its own duration.
pub fn reverse(sequence: FrameSequence) -> Result<FrameSequence, TransformError> {
    if !sequence.is_animated() {
        return Ok(sequence);
    }
    let mut frames = sequence.frames().to_vec();
    frames.reverse();
    sequence.with_frames(frames)
}

/// Play forwards then backwards without repeating the end frames.
///
/// `[a, b, c, d]` becomes `[a, b, c, d, c, b]`, so a looping animation
/// never shows the same frame twice in a row. The output has `2n - 2`
/// frames, so two frames come back unchanged and a still is a no-op.
pub fn bounce(sequence: FrameSequence) -> Result<FrameSequence, TransformError> {
    let n = sequence.len();
    if n < 2 {
        return Ok(sequence);
    }
    let frames = sequence.frames();
    let mut bounced = Vec::with_capacity(2 * n - 2);
    bounced.extend_from_slice(frames);
    bounced.extend(frames[1..n - 1].iter().rev().cloned());
    sequence.with_frames(bounced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use image::{Rgb, RgbImage};
    use proptest::prelude::*;

    fn numbered(delays: &[u32]) -> FrameSequence {
        let frames = delays
            .iter()
            .enumerate()
            .map(|(i, &d)| Frame::new(RgbImage::from_pixel(2, 2, Rgb([i as u8, 0, 0])), d))
            .collect();
        FrameSequence::new(frames).unwrap()
    }

    fn ids(seq: &FrameSequence) -> Vec<u8> {
        seq.frames().iter().map(|f| f.image().get_pixel(0, 0).0[0]).collect()
    }

    #[test]
    fn test_speed_doubles() {
        let out = speed(numbered(&[100, 200, 50]), 2.0).unwrap();
        let delays: Vec<u32> = out.frames().iter().map(|f| f.delay_ms()).collect();
        assert_eq!(delays, vec![50, 100, 25]);
    }

    #[test]
    fn test_speed_clamps_to_minimum() {
        let out = speed(numbered(&[30, 40]), 10.0).unwrap();
        assert!(out.frames().iter().all(|f| f.delay_ms() == MIN_DELAY_MS));
    }

    #[test]
    fn test_speed_slows_down() {
        let out = speed(numbered(&[100, 100]), 0.5).unwrap();
        assert_eq!(out.frames()[0].delay_ms(), 200);
    }

    #[test]
    fn test_speed_rejects_bad_factor() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                speed(numbered(&[100, 100]), factor),
                Err(TransformError::InvalidFactor(_))
            ));
        }
    }

    #[test]
    fn test_speed_on_still_is_noop() {
        let seq = numbered(&[100]);
        assert_eq!(speed(seq.clone(), 4.0).unwrap(), seq);
    }

    #[test]
    fn test_reverse() {
        let out = reverse(numbered(&[10, 20, 30])).unwrap();
        assert_eq!(ids(&out), vec![2, 1, 0]);
        assert_eq!(out.frames()[0].delay_ms(), 30);
    }

    #[test]
    fn test_bounce_mirrors_inner_frames() {
        let out = bounce(numbered(&[10, 20, 30, 40])).unwrap();
        assert_eq!(ids(&out), vec![0, 1, 2, 3, 2, 1]);
        // Midpoint is the original last frame, the tail is the original second.
        assert_eq!(ids(&out)[3], 3);
        assert_eq!(out.frames()[5].delay_ms(), 20);
    }

    #[test]
    fn test_bounce_short_sequences_unchanged() {
        assert_eq!(ids(&bounce(numbered(&[10])).unwrap()), vec![0]);
        assert_eq!(ids(&bounce(numbered(&[10, 20])).unwrap()), vec![0, 1]);
    }

    #[test]
    fn test_loop_count_preserved() {
        let seq = numbered(&[10, 20, 30]).with_loop_count(3);
        assert_eq!(bounce(seq.clone()).unwrap().loop_count(), 3);
        assert_eq!(reverse(seq.clone()).unwrap().loop_count(), 3);
        assert_eq!(speed(seq, 2.0).unwrap().loop_count(), 3);
    }

    proptest! {
        #[test]
        fn bounce_length_and_symmetry(delays in prop::collection::vec(10u32..500, 3..12)) {
            let seq = numbered(&delays);
            let n = seq.len();
            let out = bounce(seq).unwrap();
            prop_assert_eq!(out.len(), 2 * n - 2);
            let order = ids(&out);
            for k in 1..n - 1 {
                prop_assert_eq!(order[n - 1 - k], order[n - 1 + k]);
            }
        }

        #[test]
        fn speed_never_below_minimum(
            delays in prop::collection::vec(1u32..2000, 2..10),
            factor in 0.01f64..100.0,
        ) {
            let out = speed(numbered(&delays), factor).unwrap();
            prop_assert_eq!(out.len(), delays.len());
            for (frame, &before) in out.frames().iter().zip(&delays) {
                prop_assert!(frame.delay_ms() >= MIN_DELAY_MS);
                let expected = ((f64::from(before) / factor).round() as u32).max(MIN_DELAY_MS);
                prop_assert_eq!(frame.delay_ms(), expected);
            }
        }

        #[test]
        fn reverse_twice_is_identity(delays in prop::collection::vec(10u32..500, 1..10)) {
            let seq = numbered(&delays);
            prop_assert_eq!(reverse(reverse(seq.clone()).unwrap()).unwrap(), seq);
        }
    }
}
