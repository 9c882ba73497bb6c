//! Frame pipeline for turning still images and GIFs into GIF or JPEG output.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Frame extraction with per-frame durations
//! - Color normalization to opaque RGB
//! - Transforms: caption, watermark, grayscale, speed, reverse, bounce,
//!   first frame and combine
//! - GIF and JPEG encoding
//! - A request adapter that validates input and classifies failures
//!
//! ```no_run
//! use gifsmith_image::{Attachment, Command, OverlayStyle, Pipeline, PipelineRequest, PipelineSettings};
//!
//! let pipeline = Pipeline::new(PipelineSettings::default(), OverlayStyle::default());
//! let data = std::fs::read("cat.png").unwrap();
//! let request = PipelineRequest::new(Command::Caption, vec![Attachment::new("cat.png", data)])
//!     .with_argument("HELLO");
//! let output = pipeline.handle(&request).unwrap();
//! assert_eq!(output.filename, "caption.gif");
//! ```

#![warn(missing_docs)]

mod detect;
mod encode;
mod error;
mod extract;
pub mod font;
mod frame;
mod metadata;
mod normalize;
mod request;
mod settings;
pub mod transform;

pub use detect::{detect_format, SourceFormat, SUPPORTED_EXTENSIONS};
pub use encode::{encode, EncodeOptions, OutputFormat, Timing};
pub use error::{
    DecodeError, EncodeError, ErrorCategory, PipelineError, Result, TransformError, ValidationError,
};
pub use extract::{extract, gif_loop_count};
pub use font::{Region, TextExtent, Typeface};
pub use frame::{Frame, FrameSequence, DEFAULT_DELAY_MS, MIN_DELAY_MS};
pub use metadata::{inspect, probe_dimensions, SequenceMetadata};
pub use normalize::{flatten_rgba, has_alpha_channel, normalize, WHITE};
pub use request::{
    Attachment, Command, Operation, Pipeline, PipelineOutput, PipelineRequest, PipelineResult,
};
pub use settings::{OverlayStyle, PipelineSettings};
