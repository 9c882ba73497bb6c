//! Running one pipeline request from the command line.

use gifsmith_cli::output::{format_count, format_delays, format_duration, format_size, Status};
use gifsmith_cli::progress;
use gifsmith_core::config::Config;
use gifsmith_core::{Error, ErrorCode, Result, ResultExt};
use gifsmith_image::{inspect as inspect_payload, Attachment, Command, OutputFormat, Pipeline, PipelineRequest};
use gifsmith_telemetry::{metrics, Timer};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Options shared by every pipeline subcommand.
pub struct Context<'a> {
    pub config: &'a Config,
    pub out_dir: PathBuf,
    pub format: Option<OutputFormat>,
    pub quiet: bool,
}

/// Read `files`, run `command` and write the output into the out dir.
pub fn pipeline(ctx: &Context<'_>, command: Command, files: Vec<PathBuf>, argument: Option<String>) -> Result<()> {
    let started = Instant::now();
    let attachments = files
        .iter()
        .map(|path| read_attachment(path))
        .collect::<Result<Vec<_>>>()?;

    let mut request = PipelineRequest::new(command, attachments);
    request.argument = argument;
    request.output = ctx.format;

    let schema = &ctx.config.schema;
    let pipeline = Pipeline::new(schema.pipeline.clone(), schema.overlay.clone());

    let record = schema.telemetry.metrics_enabled;
    let spinner = progress::spinner(&format!("Running {command}..."), !ctx.quiet);
    let timer = stage_timer(record, format!("pipeline.{command}"));
    let result = pipeline.handle(&request);
    if let Some(timer) = timer {
        timer.stop();
    }

    if record {
        metrics().increment(&format!("requests.{command}"));
    }

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            progress::finish_error(&spinner, &format!("{command} failed"));
            if record {
                metrics().increment(&format!("failures.{}", err.category().as_str()));
            }
            return Err(err.into());
        }
    };

    std::fs::create_dir_all(&ctx.out_dir)
        .map_err(Error::from)
        .context(format!("Creating {}", ctx.out_dir.display()))?;
    let path = ctx.out_dir.join(&output.filename);
    std::fs::write(&path, &output.bytes)
        .map_err(Error::from)
        .context(format!("Writing {}", path.display()))?;

    if record {
        metrics().gauge("output.bytes", output.bytes.len() as u64);
    }
    progress::finish_success(&spinner, &output.filename);
    if !ctx.quiet {
        Status::success(&format!(
            "{} {} ({}, {}) in {}",
            output.format,
            path.display(),
            format_count(output.frame_count, "frame", "frames"),
            format_size(output.bytes.len() as u64),
            format_duration(started.elapsed()),
        ));
    }
    println!("{}", path.display());
    Ok(())
}

/// Print what a payload holds.
pub fn inspect(path: &Path, json: bool) -> anyhow::Result<()> {
    let attachment = read_attachment(path)?;
    let meta = inspect_payload(&attachment.data).map_err(|e| {
        Error::new(ErrorCode::DecodeFailed, format!("Could not open the image: {e}")).with_source(e)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("Format: {}", meta.format);
        println!("Dimensions: {}x{}", meta.width, meta.height);
        println!("Aspect Ratio: {:.2}", meta.aspect_ratio());
        println!("Frames: {}", meta.frame_count);
        println!("Delays: {}", format_delays(&meta.delays_ms));
        println!("Duration: {}ms", meta.total_duration_ms);
        println!("Size: {}", format_size(meta.size_bytes as u64));
    }
    Ok(())
}

/// Timer for a stage, or nothing when metrics are switched off.
fn stage_timer(enabled: bool, name: String) -> Option<Timer> {
    enabled.then(|| Timer::start(name))
}

fn read_attachment(path: &Path) -> Result<Attachment> {
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::file_not_found(path),
        _ => Error::from(e).with_context(format!("Reading {}", path.display())),
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment::new(filename, data))
}
