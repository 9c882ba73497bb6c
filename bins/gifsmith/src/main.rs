//! gifsmith: turn images and GIFs into captioned, retimed or combined output.

use clap::{Args, Parser, Subcommand, ValueEnum};
use gifsmith_core::config::Config;
use gifsmith_core::error::exit_codes;
use gifsmith_core::health::{HealthChecker, PathCheck};
use gifsmith_core::Error;
use gifsmith_cli::output::Status;
use gifsmith_image::{Command, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;

mod run;
mod server;

#[derive(Parser)]
#[command(name = "gifsmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to gifsmith.toml in the usual places)
    #[arg(short, long, global = true, env = "GIFSMITH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory output files are written to
    #[arg(short, long, global = true, default_value = ".")]
    out_dir: PathBuf,

    /// Force the output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<FormatArg>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors and results
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Gif,
    Jpeg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Gif => OutputFormat::Gif,
            FormatArg::Jpeg => OutputFormat::Jpeg,
        }
    }
}

#[derive(Args)]
struct Source {
    /// Image or GIF to read
    file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-encode an image as GIF
    Convert(Source),

    /// Add a text band along the bottom edge
    Caption {
        #[command(flatten)]
        source: Source,
        /// Caption text
        text: String,
    },

    /// Stamp text in the bottom-right corner
    Watermark {
        #[command(flatten)]
        source: Source,
        /// Watermark text
        text: String,
    },

    /// Drop color from every frame
    Grayscale(Source),

    /// Play an animation backwards
    Reverse(Source),

    /// Play forwards then backwards
    Bounce(Source),

    /// Speed an animation up (factor > 1) or slow it down (factor < 1)
    Speed {
        #[command(flatten)]
        source: Source,
        /// Speed factor
        #[arg(allow_hyphen_values = true)]
        factor: String,
    },

    /// Join several images and GIFs into one animation
    Combine {
        /// Files in playback order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract the first frame as JPEG
    Still(Source),

    /// Describe an image: format, size, frames and timing
    Inspect {
        #[command(flatten)]
        source: Source,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check codecs, fonts and configuration
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the liveness endpoint and pipeline uploads over HTTP
    Serve {
        /// Listen address (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<Error>() {
                Some(core) => {
                    Status::error(&core.message);
                    if let Some(suggestion) = &core.suggestion {
                        Status::info(suggestion);
                    }
                    core.exit_code()
                }
                None => {
                    Status::error(&format!("{err:#}"));
                    exit_codes::FAILURE
                }
            };
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let mut telemetry = config.schema.telemetry.clone();
    if cli.verbose {
        telemetry.log_level = "debug".to_string();
    } else if cli.quiet {
        telemetry.log_level = "warn".to_string();
    }
    gifsmith_telemetry::init_with_config(&telemetry)?;

    let ctx = run::Context {
        config: &config,
        out_dir: cli.out_dir,
        format: cli.format.map(OutputFormat::from),
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Convert(s) => run::pipeline(&ctx, Command::Convert, vec![s.file], None)?,
        Commands::Caption { source, text } => {
            run::pipeline(&ctx, Command::Caption, vec![source.file], Some(text))?
        }
        Commands::Watermark { source, text } => {
            run::pipeline(&ctx, Command::Watermark, vec![source.file], Some(text))?
        }
        Commands::Grayscale(s) => run::pipeline(&ctx, Command::Grayscale, vec![s.file], None)?,
        Commands::Reverse(s) => run::pipeline(&ctx, Command::Reverse, vec![s.file], None)?,
        Commands::Bounce(s) => run::pipeline(&ctx, Command::Bounce, vec![s.file], None)?,
        Commands::Speed { source, factor } => {
            run::pipeline(&ctx, Command::Speed, vec![source.file], Some(factor))?
        }
        Commands::Combine { files } => run::pipeline(&ctx, Command::Combine, files, None)?,
        Commands::Still(s) => run::pipeline(&ctx, Command::Still, vec![s.file], None)?,
        Commands::Inspect { source, json } => run::inspect(&source.file, json)?,
        Commands::Health { json } => {
            let report = HealthChecker::new()
                .with_standard_checks(&config.schema)
                .add_check(PathCheck::writable(&ctx.out_dir))
                .run();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                Status::health(&report);
            }
            if !report.status.is_operational() {
                return Err(Error::new(
                    gifsmith_core::ErrorCode::Internal,
                    format!("{} health check(s) failed", report.failed_checks().len()),
                )
                .into());
            }
        }
        Commands::Serve { bind } => {
            let mut server = config.schema.server.clone();
            if let Some(bind) = bind {
                server.bind = bind;
            }
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::server("Failed to start async runtime").with_source(e))?;
            runtime.block_on(server::serve(server, config.schema.clone()))?;
        }
    }

    if cli.verbose {
        tracing::debug!(metrics = %gifsmith_telemetry::metrics().export_json(), "Session metrics");
    }
    Ok(())
}
