//! Configuration schema definitions

use crate::error::{Error, Result};
use gifsmith_image::{OverlayStyle, PipelineSettings};
use gifsmith_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Encoding and request limits
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Caption and watermark look
    #[serde(default)]
    pub overlay: OverlayStyle,

    /// Liveness server
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging and metrics
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Liveness server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Body returned by `GET /`
    #[serde(default = "default_liveness_text")]
    pub liveness_text: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            liveness_text: default_liveness_text(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_liveness_text() -> String {
    "I'm alive".to_string()
}

impl ConfigSchema {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if !(1..=100).contains(&pipeline.jpeg_quality) {
            return Err(Error::invalid_config(
                "pipeline.jpeg_quality",
                format!("JPEG quality must be between 1 and 100, got {}", pipeline.jpeg_quality),
            ));
        }
        if !(1..=30).contains(&pipeline.gif_speed) {
            return Err(Error::invalid_config(
                "pipeline.gif_speed",
                format!("GIF speed must be between 1 and 30, got {}", pipeline.gif_speed),
            ));
        }
        if pipeline.max_attachments < 2 {
            return Err(Error::invalid_config(
                "pipeline.max_attachments",
                "At least 2 attachments must be allowed so combine can run",
            ));
        }
        if pipeline.max_dimension == 0 {
            return Err(Error::invalid_config("pipeline.max_dimension", "Maximum dimension must be positive"));
        }

        let overlay = &self.overlay;
        if !overlay.font_size.is_finite() || overlay.font_size <= 0.0 {
            return Err(Error::invalid_config(
                "overlay.font_size",
                format!("Font size must be a positive number, got {}", overlay.font_size),
            ));
        }
        if overlay.padding > pipeline.max_dimension / 2 {
            return Err(Error::invalid_config(
                "overlay.padding",
                format!("Padding {} leaves no room for text", overlay.padding),
            ));
        }

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::invalid_config(
                "server.bind",
                format!("'{}' is not a socket address like 0.0.0.0:8080", self.server.bind),
            ));
        }
        if self.telemetry.log_level.trim().is_empty() {
            return Err(Error::invalid_config("telemetry.log_level", "Log level must not be empty"));
        }
        Ok(())
    }
}
