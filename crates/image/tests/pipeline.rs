//! End-to-end pipeline behavior through the public API.

use gifsmith_image::{
    extract, inspect, normalize, transform, Attachment, Command, DecodeError, Frame, FrameSequence,
    OutputFormat, OverlayStyle, Pipeline, PipelineError, PipelineRequest, PipelineSettings,
    SourceFormat, Typeface, ValidationError, DEFAULT_DELAY_MS,
};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use proptest::prelude::*;
use std::io::Cursor;

fn still_bytes(img: RgbImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

fn opaque(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 200) as u8, (y % 200) as u8, 77]))
}

fn animated_gif(delays_ms: &[u32], loop_count: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let repeat = if loop_count == 0 { Repeat::Infinite } else { Repeat::Finite(loop_count) };
        encoder.set_repeat(repeat).unwrap();
        for (i, &delay) in delays_ms.iter().enumerate() {
            let shade = if i % 2 == 0 { 0 } else { 255 };
            let rgba = RgbaImage::from_pixel(12, 10, Rgba([shade, shade, shade, 255]));
            let frame = image::Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(delay, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }
    bytes
}

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineSettings::default(), OverlayStyle::default())
        .with_typeface(Typeface::Bitmap { scale: 3 })
}

fn delays(seq: &FrameSequence) -> Vec<u32> {
    seq.frames().iter().map(|f| f.delay_ms()).collect()
}

#[test]
fn still_input_extracts_one_default_frame() {
    for format in [ImageOutputFormat::Png, ImageOutputFormat::Jpeg(90), ImageOutputFormat::Bmp] {
        let seq = extract(&still_bytes(opaque(30, 20), format)).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.dimensions(), (30, 20));
        assert_eq!(seq.first().delay_ms(), DEFAULT_DELAY_MS);
    }
}

#[test]
fn animated_input_keeps_order_and_durations() {
    let seq = extract(&animated_gif(&[100, 200, 50, 70], 0)).unwrap();
    assert_eq!(seq.len(), 4);
    assert_eq!(delays(&seq), vec![100, 200, 50, 70]);
    assert_eq!(seq.frames()[0].image().get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(seq.frames()[1].image().get_pixel(0, 0).0, [255, 255, 255]);
}

#[test]
fn renamed_file_is_a_decode_error() {
    let text = Attachment::new("holiday.gif", b"this is plain text, not a picture".to_vec());
    let err = pipeline()
        .handle(&PipelineRequest::new(Command::Reverse, vec![text]))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decode(DecodeError::UnknownFormat)));
    assert!(err.user_message().starts_with("Could not open the image"));
}

#[test]
fn zero_attachments_is_validation_error() {
    let err = pipeline()
        .handle(&PipelineRequest::new(Command::Caption, vec![]).with_argument("HELLO"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(ValidationError::NoAttachment)));
    assert_eq!(err.to_string(), "validation error: no attachment");
}

#[test]
fn non_positive_speed_is_validation_error() {
    let gif = Attachment::new("a.gif", animated_gif(&[100, 100], 0));
    for factor in ["0", "0.0", "-2"] {
        let request = PipelineRequest::new(Command::Speed, vec![gif.clone()]).with_argument(factor);
        let err = pipeline().handle(&request).unwrap_err();
        assert!(
            matches!(err, PipelineError::Validation(ValidationError::InvalidFactor(_))),
            "{factor}: {err}"
        );
    }
}

#[test]
fn combine_two_stills_in_submission_order() {
    let black = Attachment::new("black.png", still_bytes(RgbImage::new(16, 16), ImageOutputFormat::Png));
    let white = Attachment::new(
        "white.png",
        still_bytes(RgbImage::from_pixel(16, 16, Rgb([255, 255, 255])), ImageOutputFormat::Png),
    );

    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Combine, vec![black, white]))
        .unwrap();
    assert_eq!(out.filename, "combined.gif");
    assert_eq!(out.frame_count, 2);

    let back = extract(&out.bytes).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back.frames()[0].image().get_pixel(8, 8).0, [0, 0, 0]);
    assert_eq!(back.frames()[1].image().get_pixel(8, 8).0, [255, 255, 255]);
}

#[test]
fn caption_changes_only_the_bottom_band() {
    let style = OverlayStyle::default();
    let face = Typeface::Bitmap { scale: 3 };
    let source = opaque(400, 300);
    let bytes = still_bytes(source.clone(), ImageOutputFormat::Png);

    // Transform stage output, compared pixel for pixel.
    let normalized = extract(&bytes).unwrap();
    assert_eq!(normalized.first().image(), &source);
    let band = transform::caption_band(400, 300, "HELLO", &face, &style);
    let captioned = transform::caption(normalized, "HELLO", &face, &style).unwrap();
    let img = captioned.first().image();
    assert_eq!(img.dimensions(), (400, 300));
    for y in 0..band.y {
        for x in 0..400 {
            assert_eq!(img.get_pixel(x, y), source.get_pixel(x, y));
        }
    }
    assert_ne!(img, &source);

    // Full request produces a single-frame GIF of the same size.
    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Caption, vec![Attachment::new("in.png", bytes)]).with_argument("HELLO"))
        .unwrap();
    assert_eq!(out.filename, "caption.gif");
    let meta = inspect(&out.bytes).unwrap();
    assert_eq!(meta.format, SourceFormat::Gif);
    assert_eq!((meta.width, meta.height), (400, 300));
    assert_eq!(meta.frame_count, 1);
}

#[test]
fn static_round_trip_keeps_size() {
    for format in [OutputFormat::Gif, OutputFormat::Jpeg] {
        let seq = FrameSequence::single(Frame::still(opaque(33, 21)));
        let bytes = gifsmith_image::encode(&seq, format, &Default::default()).unwrap();
        let back = extract(&bytes).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.dimensions(), (33, 21));
    }
}

#[test]
fn bounce_request_on_animation() {
    let gif = Attachment::new("loop.gif", animated_gif(&[100, 200, 300], 0));
    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Bounce, vec![gif]))
        .unwrap();
    assert_eq!(out.filename, "bounce.gif");
    let back = extract(&out.bytes).unwrap();
    assert_eq!(delays(&back), vec![100, 200, 300, 200]);
}

#[test]
fn speed_request_halves_durations() {
    let gif = Attachment::new("loop.gif", animated_gif(&[100, 200, 40], 0));
    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Speed, vec![gif]).with_argument("2"))
        .unwrap();
    assert_eq!(out.filename, "speed.gif");
    assert_eq!(delays(&extract(&out.bytes).unwrap()), vec![50, 100, 20]);
}

#[test]
fn source_loop_count_survives_a_request() {
    let gif = Attachment::new("thrice.gif", animated_gif(&[100, 200, 300], 3));
    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Reverse, vec![gif.clone()]))
        .unwrap();
    assert_eq!(extract(&out.bytes).unwrap().loop_count(), 3);

    let combined = pipeline()
        .handle(&PipelineRequest::new(Command::Combine, vec![gif.clone(), gif.clone()]))
        .unwrap();
    assert_eq!(extract(&combined.bytes).unwrap().loop_count(), 3);

    let settings = PipelineSettings {
        loop_count: Some(0),
        ..PipelineSettings::default()
    };
    let forever = Pipeline::new(settings, OverlayStyle::default())
        .with_typeface(Typeface::Bitmap { scale: 3 })
        .handle(&PipelineRequest::new(Command::Reverse, vec![gif]))
        .unwrap();
    assert_eq!(extract(&forever.bytes).unwrap().loop_count(), 0);
}

#[test]
fn still_request_writes_first_frame_jpeg() {
    let gif = Attachment::new("loop.gif", animated_gif(&[100, 100, 100], 0));
    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Still, vec![gif]))
        .unwrap();
    assert_eq!(out.filename, "frame.jpg");
    assert_eq!(out.frame_count, 1);
    assert_eq!(inspect(&out.bytes).unwrap().format, SourceFormat::Jpeg);
}

#[test]
fn transparent_png_is_flattened_onto_white() {
    let rgba = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    let seq = extract(&buffer.into_inner()).unwrap();
    assert_eq!(seq.first().image().get_pixel(1, 1).0, [255, 255, 255]);
}

#[test]
fn output_can_be_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let png = Attachment::new("a.png", still_bytes(opaque(10, 10), ImageOutputFormat::Png));
    let out = pipeline()
        .handle(&PipelineRequest::new(Command::Grayscale, vec![png]))
        .unwrap();
    let path = dir.path().join(&out.filename);
    std::fs::write(&path, &out.bytes).unwrap();
    let meta = inspect(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!((meta.width, meta.height), (10, 10));
}

proptest! {
    #[test]
    fn normalize_is_idempotent(pixels in prop::collection::vec(any::<[u8; 4]>(), 16)) {
        let rgba = RgbaImage::from_fn(4, 4, |x, y| Rgba(pixels[(y * 4 + x) as usize]));
        let once = normalize(&DynamicImage::ImageRgba8(rgba));
        let twice = normalize(&DynamicImage::ImageRgb8(once.clone()));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn bounce_midpoint_is_last_frame(n in 2usize..10) {
        let frames = (0..n)
            .map(|i| Frame::new(RgbImage::from_pixel(2, 2, Rgb([i as u8, 0, 0])), 100))
            .collect();
        let out = transform::bounce(FrameSequence::new(frames).unwrap()).unwrap();
        prop_assert_eq!(out.len(), 2 * n - 2);
        prop_assert_eq!(out.frames()[n - 1].image().get_pixel(0, 0).0[0], (n - 1) as u8);
        prop_assert_eq!(out.frames().last().unwrap().image().get_pixel(0, 0).0[0], 1);
    }

    #[test]
    fn speed_factor_one_is_identity(d in prop::collection::vec(10u32..1000, 2..8)) {
        let frames = d.iter().map(|&ms| Frame::new(RgbImage::new(2, 2), ms)).collect();
        let seq = FrameSequence::new(frames).unwrap();
        prop_assert_eq!(transform::speed(seq.clone(), 1.0).unwrap(), seq);
    }
}
