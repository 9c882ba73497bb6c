//! Request adapter: validates an incoming request, runs the pipeline and
//! classifies whatever goes wrong.

use crate::detect::SourceFormat;
use crate::encode::{encode, EncodeOptions, OutputFormat};
use crate::error::{PipelineError, ValidationError};
use crate::extract::extract;
use crate::font::Typeface;
use crate::frame::FrameSequence;
use crate::metadata::probe_dimensions;
use crate::settings::{OverlayStyle, PipelineSettings};
use crate::transform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

/// Operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Re-encode the first attachment as GIF
    Convert,
    /// Text band along the bottom edge
    Caption,
    /// Text box in the bottom-right corner
    Watermark,
    /// Drop color
    Grayscale,
    /// Play backwards
    Reverse,
    /// Play forwards then backwards
    Bounce,
    /// Rescale frame durations
    Speed,
    /// Join several attachments into one animation
    Combine,
    /// First frame as JPEG
    Still,
}

impl Command {
    /// Every command, in help order.
    pub const ALL: [Command; 9] = [
        Command::Convert,
        Command::Caption,
        Command::Watermark,
        Command::Grayscale,
        Command::Reverse,
        Command::Bounce,
        Command::Speed,
        Command::Combine,
        Command::Still,
    ];

    /// Name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Convert => "convert",
            Command::Caption => "caption",
            Command::Watermark => "watermark",
            Command::Grayscale => "grayscale",
            Command::Reverse => "reverse",
            Command::Bounce => "bounce",
            Command::Speed => "speed",
            Command::Combine => "combine",
            Command::Still => "still",
        }
    }

    /// Output file name without extension.
    pub fn output_stem(&self) -> &'static str {
        match self {
            Command::Convert => "converted",
            Command::Combine => "combined",
            Command::Still => "frame",
            other => other.name(),
        }
    }

    /// Format written when the request does not pick one.
    pub fn default_output(&self) -> OutputFormat {
        match self {
            Command::Still => OutputFormat::Jpeg,
            _ => OutputFormat::Gif,
        }
    }

    /// Fewest attachments the command accepts.
    pub fn min_attachments(&self) -> usize {
        match self {
            Command::Combine => 2,
            _ => 1,
        }
    }

    /// Whether the argument is overlay text.
    pub fn needs_text(&self) -> bool {
        matches!(self, Command::Caption | Command::Watermark)
    }

    /// Whether the argument is a speed factor.
    pub fn needs_factor(&self) -> bool {
        matches!(self, Command::Speed)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Command::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}

/// One attached payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Name the sender gave the file
    pub filename: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment.
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Everything one invocation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    /// Operation to run
    pub command: Command,
    /// Source payloads in submission order
    pub attachments: Vec<Attachment>,
    /// Free text for overlays or the speed factor
    pub argument: Option<String>,
    /// Output format override
    pub output: Option<OutputFormat>,
}

impl PipelineRequest {
    /// Request with no argument and the command's default output.
    pub fn new(command: Command, attachments: Vec<Attachment>) -> Self {
        Self {
            command,
            attachments,
            argument: None,
            output: None,
        }
    }

    /// Set the text or factor argument.
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    /// Force the output format.
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }
}

/// A validated request, parameters parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Plain re-encode
    Convert,
    /// Caption with this text
    Caption(String),
    /// Watermark with this text
    Watermark(String),
    /// Grayscale
    Grayscale,
    /// Reverse
    Reverse,
    /// Bounce
    Bounce,
    /// Speed by this factor
    Speed(f64),
    /// Combine all attachments
    Combine,
    /// First frame only
    Still,
}

/// Encoded result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Fixed per command, extension follows the format
    pub filename: String,
    /// Container written
    pub format: OutputFormat,
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// Frames in the output
    pub frame_count: usize,
}

/// Output bytes or a categorized failure.
pub type PipelineResult = Result<PipelineOutput, PipelineError>;

/// Stateless request processor.
///
/// Holds only configuration and the loaded typeface, so one instance can
/// serve any number of requests, including concurrently.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: PipelineSettings,
    style: OverlayStyle,
    typeface: Typeface,
}

impl Pipeline {
    /// Build a pipeline, loading the overlay font once.
    pub fn new(settings: PipelineSettings, style: OverlayStyle) -> Self {
        let typeface = Typeface::load(style.font_path.as_deref(), style.font_size);
        Self {
            settings,
            style,
            typeface,
        }
    }

    /// Use `typeface` instead of the configured one.
    pub fn with_typeface(mut self, typeface: Typeface) -> Self {
        self.typeface = typeface;
        self
    }

    /// Typeface overlays are drawn with.
    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    /// Active settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Check a request without decoding pixels.
    pub fn validate(&self, request: &PipelineRequest) -> Result<Operation, ValidationError> {
        let command = request.command;
        let provided = request.attachments.len();

        if provided == 0 {
            return Err(ValidationError::NoAttachment);
        }
        if provided < command.min_attachments() {
            return Err(ValidationError::NotEnoughAttachments {
                required: command.min_attachments(),
                provided,
            });
        }
        if provided > self.settings.max_attachments {
            return Err(ValidationError::TooManyAttachments {
                max: self.settings.max_attachments,
                provided,
            });
        }

        for attachment in &request.attachments {
            if SourceFormat::from_filename(&attachment.filename).is_none() {
                return Err(ValidationError::UnsupportedExtension {
                    filename: attachment.filename.clone(),
                });
            }
            if let Some((width, height)) = probe_dimensions(&attachment.data) {
                let max = self.settings.max_dimension;
                if width > max || height > max {
                    return Err(ValidationError::ImageTooLarge { width, height, max });
                }
            }
        }

        let text = || -> Result<String, ValidationError> {
            match request.argument.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => Ok(text.to_string()),
                _ => Err(ValidationError::MissingText),
            }
        };

        let operation = match command {
            Command::Convert => Operation::Convert,
            Command::Caption => Operation::Caption(text()?),
            Command::Watermark => Operation::Watermark(text()?),
            Command::Grayscale => Operation::Grayscale,
            Command::Reverse => Operation::Reverse,
            Command::Bounce => Operation::Bounce,
            Command::Speed => Operation::Speed(parse_factor(request.argument.as_deref())?),
            Command::Combine => Operation::Combine,
            Command::Still => Operation::Still,
        };
        Ok(operation)
    }

    /// Run a request end to end.
    ///
    /// Either the whole output is produced or an error is returned; there
    /// is no partial result.
    pub fn handle(&self, request: &PipelineRequest) -> PipelineResult {
        let started = Instant::now();
        let result = self.run(request);

        match &result {
            Ok(output) => info!(
                command = %request.command,
                filename = %output.filename,
                frames = output.frame_count,
                bytes = output.bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Request completed"
            ),
            Err(err) => warn!(
                command = %request.command,
                category = err.category().as_str(),
                error = %err,
                "Request failed"
            ),
        }
        result
    }

    fn run(&self, request: &PipelineRequest) -> PipelineResult {
        let operation = self.validate(request)?;
        let format = request.output.unwrap_or_else(|| request.command.default_output());

        let sequence = match operation {
            Operation::Combine => {
                let sources = request
                    .attachments
                    .iter()
                    .map(|a| extract(&a.data))
                    .collect::<Result<Vec<_>, _>>()?;
                transform::combine(sources)?
            }
            other => {
                // Validation guarantees at least one attachment.
                let source = extract(&request.attachments[0].data)?;
                self.apply(other, source)?
            }
        };

        let sequence = match self.settings.loop_count {
            Some(loop_count) => sequence.with_loop_count(loop_count),
            None => sequence,
        };
        let sequence = if format.supports_animation() {
            sequence
        } else {
            transform::first_frame(sequence)
        };

        let bytes = encode(&sequence, format, &self.encode_options())?;
        Ok(PipelineOutput {
            filename: format!("{}.{}", request.command.output_stem(), format.extension()),
            format,
            bytes,
            frame_count: sequence.len(),
        })
    }

    fn apply(&self, operation: Operation, sequence: FrameSequence) -> Result<FrameSequence, PipelineError> {
        let sequence = match operation {
            Operation::Convert | Operation::Combine => sequence,
            Operation::Caption(text) => transform::caption(sequence, &text, &self.typeface, &self.style)?,
            Operation::Watermark(text) => transform::watermark(sequence, &text, &self.typeface, &self.style)?,
            Operation::Grayscale => transform::grayscale(sequence)?,
            Operation::Reverse => transform::reverse(sequence)?,
            Operation::Bounce => transform::bounce(sequence)?,
            Operation::Speed(factor) => transform::speed(sequence, factor)?,
            Operation::Still => transform::first_frame(sequence),
        };
        Ok(sequence)
    }

    fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            timing: self.settings.timing,
            jpeg_quality: self.settings.jpeg_quality,
            gif_speed: self.settings.gif_speed,
        }
    }
}

fn parse_factor(raw: Option<&str>) -> Result<f64, ValidationError> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ValidationError::MissingFactor),
    };
    match raw.parse::<f64>() {
        Ok(factor) if factor.is_finite() && factor > 0.0 => Ok(factor),
        _ => Err(ValidationError::InvalidFactor(raw.to_string())),
    }
}
