//! Benchmarks for the frame pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gifsmith_image::{
    detect_format, encode, normalize, transform, EncodeOptions, Frame, FrameSequence, OutputFormat,
    OverlayStyle, Typeface,
};
use image::{DynamicImage, Rgba, RgbaImage};

fn checker(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let on = (x / 8 + y / 8) % 2 == 0;
        Rgba([if on { 220 } else { 30 }, (x % 256) as u8, (y % 256) as u8, if on { 255 } else { 96 }])
    })
}

fn animation(frames: usize) -> FrameSequence {
    let rgba = checker(160, 120);
    let frames = (0..frames).map(|_| Frame::from_rgba(&rgba, 50)).collect();
    FrameSequence::new(frames).unwrap()
}

fn bench_format_detection(c: &mut Criterion) {
    let gif_data = b"GIF89a\x10\x00\x10\x00".to_vec();
    let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    c.bench_function("detect_gif", |b| b.iter(|| detect_format(black_box(&gif_data))));
    c.bench_function("detect_png", |b| b.iter(|| detect_format(black_box(&png_data))));
}

fn bench_normalize(c: &mut Criterion) {
    let img = DynamicImage::ImageRgba8(checker(640, 480));

    c.bench_function("normalize_640x480_rgba", |b| b.iter(|| normalize(black_box(&img))));
}

fn bench_transforms(c: &mut Criterion) {
    let seq = animation(12);
    let style = OverlayStyle::default();
    let face = Typeface::Bitmap { scale: 3 };

    c.bench_function("caption_12_frames", |b| {
        b.iter(|| transform::caption(black_box(seq.clone()), "BENCHMARK", &face, &style))
    });
    c.bench_function("grayscale_12_frames", |b| {
        b.iter(|| transform::grayscale(black_box(seq.clone())))
    });
    c.bench_function("bounce_12_frames", |b| b.iter(|| transform::bounce(black_box(seq.clone()))));
}

fn bench_encode(c: &mut Criterion) {
    let seq = animation(6);
    let options = EncodeOptions::default();

    let mut group = c.benchmark_group("encode");
    group.sample_size(10);
    group.bench_function("gif_6_frames", |b| {
        b.iter(|| encode(black_box(&seq), OutputFormat::Gif, &options))
    });
    group.finish();
}

criterion_group!(benches, bench_format_detection, bench_normalize, bench_transforms, bench_encode);
criterion_main!(benches);
