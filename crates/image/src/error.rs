//! Error types for the frame pipeline.
//!
//! Every stage reports failures through one of four categories. The request
//! adapter only ever sees a [`PipelineError`], which knows its category and
//! how to phrase itself for the person who sent the request.

use crate::detect::SourceFormat;
use crate::encode::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure category, used for metrics and user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed or missing request input
    Validation,
    /// Payload is not a recognized image or container
    Decode,
    /// An operation received a sequence it cannot work with
    Transform,
    /// Output could not be produced
    Encode,
}

impl ErrorCategory {
    /// Stable numeric code for the category.
    pub fn code(&self) -> u32 {
        match self {
            ErrorCategory::Validation => 1000,
            ErrorCategory::Decode => 2000,
            ErrorCategory::Transform => 3000,
            ErrorCategory::Encode => 4000,
        }
    }

    /// Lowercase name, used as a metrics key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Decode => "decode",
            ErrorCategory::Transform => "transform",
            ErrorCategory::Encode => "encode",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Request input problems, detected before any decoding happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The request carried no attachment at all
    #[error("no attachment")]
    NoAttachment,

    /// Fewer attachments than the command needs
    #[error("expected at least {required} attachments, got {provided}")]
    NotEnoughAttachments {
        /// Minimum for the command
        required: usize,
        /// Number supplied
        provided: usize,
    },

    /// More attachments than the configured maximum
    #[error("too many attachments: {provided} (max {max})")]
    TooManyAttachments {
        /// Configured maximum
        max: usize,
        /// Number supplied
        provided: usize,
    },

    /// Attachment filename does not carry a supported extension
    #[error("unsupported file type: {filename}")]
    UnsupportedExtension {
        /// Offending filename
        filename: String,
    },

    /// Overlay command without text
    #[error("missing text argument")]
    MissingText,

    /// Speed command without a factor
    #[error("missing speed factor")]
    MissingFactor,

    /// Speed factor that is not a finite number above zero
    #[error("invalid speed factor '{0}': expected a number greater than zero")]
    InvalidFactor(String),

    /// Image header announces dimensions above the configured limit
    #[error("image is {width}x{height}, larger than the {max}px limit")]
    ImageTooLarge {
        /// Announced width
        width: u32,
        /// Announced height
        height: u32,
        /// Configured limit on either side
        max: u32,
    },
}

/// The payload could not be turned into frames.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Magic bytes match no supported format
    #[error("unrecognized image data")]
    UnknownFormat,

    /// Not enough bytes to identify anything
    #[error("payload is too short to be an image ({0} bytes)")]
    Truncated(usize),

    /// A container that decoded to zero frames
    #[error("{0} container holds no frames")]
    NoFrames(SourceFormat),

    /// The codec rejected the payload
    #[error("failed to decode {format}: {source}")]
    Image {
        /// Format the payload claimed to be
        format: SourceFormat,
        /// Codec error
        #[source]
        source: image::ImageError,
    },
}

/// A transform received a sequence it cannot handle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// A sequence must hold at least one frame
    #[error("frame sequence is empty")]
    EmptySequence,

    /// A frame does not match the size of the first frame
    #[error("frame {index} is {}x{}, expected {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    DimensionMismatch {
        /// Position of the offending frame
        index: usize,
        /// Size of the first frame
        expected: (u32, u32),
        /// Size of the offending frame
        found: (u32, u32),
    },

    /// Speed factor outside the valid range
    #[error("speed factor must be finite and greater than zero, got {0}")]
    InvalidFactor(f64),
}

/// The output container could not be produced.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Output selector names a format this crate does not write
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// A still-only format was handed several frames
    #[error("{format} output holds a single frame, got {frames}")]
    MultiFrameUnsupported {
        /// Requested output
        format: OutputFormat,
        /// Frames in the sequence
        frames: usize,
    },

    /// Frame sizes diverge at encode time
    #[error("frame {index} is {}x{}, expected {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    DimensionMismatch {
        /// Position of the offending frame
        index: usize,
        /// Size of the first frame
        expected: (u32, u32),
        /// Size of the offending frame
        found: (u32, u32),
    },

    /// The codec failed while writing
    #[error("failed to encode {format}: {source}")]
    Image {
        /// Requested output
        format: OutputFormat,
        /// Codec error
        #[source]
        source: image::ImageError,
    },
}

/// Any pipeline failure, tagged by category.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// See [`ValidationError`]
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// See [`DecodeError`]
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// See [`TransformError`]
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// See [`EncodeError`]
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl PipelineError {
    /// Category of this failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Validation(_) => ErrorCategory::Validation,
            PipelineError::Decode(_) => ErrorCategory::Decode,
            PipelineError::Transform(_) => ErrorCategory::Transform,
            PipelineError::Encode(_) => ErrorCategory::Encode,
        }
    }

    /// Message meant for the person who sent the request.
    ///
    /// Validation failures get a specific hint; the other categories keep the
    /// underlying cause text so the report stays diagnosable.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(err) => match err {
                ValidationError::NoAttachment => {
                    "Attach an image (png, jpg, jpeg, webp, bmp or gif) to the command.".to_string()
                }
                ValidationError::NotEnoughAttachments { required, .. } => {
                    format!("This command needs at least {required} images attached.")
                }
                ValidationError::TooManyAttachments { max, .. } => {
                    format!("Too many images attached, the limit is {max}.")
                }
                ValidationError::UnsupportedExtension { filename } => format!(
                    "'{filename}' is not a supported image. Use png, jpg, jpeg, webp, bmp or gif."
                ),
                ValidationError::MissingText => "This command needs some text.".to_string(),
                ValidationError::MissingFactor => {
                    "Give a speed factor, for example 2 (faster) or 0.5 (slower).".to_string()
                }
                ValidationError::InvalidFactor(raw) => {
                    format!("'{raw}' is not a valid speed factor, use a number greater than 0.")
                }
                ValidationError::ImageTooLarge { max, .. } => {
                    format!("The image is too large, each side must be at most {max} pixels.")
                }
            },
            PipelineError::Decode(err) => format!("Could not open the image: {err}"),
            PipelineError::Transform(err) => format!("Could not transform the image: {err}"),
            PipelineError::Encode(err) => format!("Conversion failed: {err}"),
        }
    }
}
