//! Health checks backing `gifsmith health` and the `/health` route
//!
//! - Codec self-test (encode and decode a tiny image in every output format)
//! - Font availability
//! - Configuration sanity
//! - Output directory access

use crate::config::ConfigSchema;
use gifsmith_image::{encode, extract, EncodeOptions, Frame, FrameSequence, OutputFormat, Typeface};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All checks passed
    Healthy,
    /// Some optional checks failed
    Degraded,
    /// Required checks failed
    Unhealthy,
}

impl HealthStatus {
    /// Returns true if status is healthy
    #[must_use] pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Returns true if status is healthy or degraded (still operational)
    #[must_use] pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Status of the check
    pub status: HealthStatus,
    /// Optional message with details
    pub message: Option<String>,
    /// Duration of the check in milliseconds
    pub duration_ms: u64,
    /// Additional details as key-value pairs
    pub details: HashMap<String, String>,
}

impl CheckResult {
    /// Create a healthy check result
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            duration_ms: 0,
            details: HashMap::new(),
        }
    }

    /// Create an unhealthy check result with a message
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            duration_ms: 0,
            details: HashMap::new(),
        }
    }

    /// Create a degraded check result with a message
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            duration_ms: 0,
            details: HashMap::new(),
        }
    }

    /// Set the duration of the check
    #[must_use] pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Add a detail key-value pair
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Overall health report containing all check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status based on all checks
    pub status: HealthStatus,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Total duration of all checks in milliseconds
    pub total_duration_ms: u64,
    /// Timestamp when the report was generated
    pub timestamp: String,
    /// Version of the tool
    pub version: String,
}

impl HealthReport {
    /// Create a new health report from check results
    #[must_use] pub fn new(checks: Vec<CheckResult>, duration: Duration) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            checks,
            total_duration_ms: duration.as_millis() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Returns true if overall status is healthy
    #[must_use] pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Get all checks that failed (not healthy)
    #[must_use] pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| !c.status.is_healthy())
            .collect()
    }
}

/// Health checker with configurable checks
pub struct HealthChecker {
    checks: Vec<Box<dyn HealthCheck>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    /// Create a new health checker with no checks
    #[must_use] pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a health check
    pub fn add_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Codec, font and config checks for a loaded configuration
    #[must_use] pub fn with_standard_checks(self, config: &ConfigSchema) -> Self {
        self.add_check(CodecCheck)
            .add_check(FontCheck::new(config.overlay.font_path.clone(), config.overlay.font_size))
            .add_check(ConfigCheck::new(config.clone()))
    }

    /// Run all health checks
    #[must_use] pub fn run(&self) -> HealthReport {
        let start = Instant::now();
        let mut results = Vec::new();

        for check in &self.checks {
            let check_start = Instant::now();
            let mut result = check.check();
            result.duration_ms = check_start.elapsed().as_millis() as u64;
            results.push(result);
        }

        HealthReport::new(results, start.elapsed())
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    /// Perform the health check and return a result
    fn check(&self) -> CheckResult;
}

/// Encode a 2x2 frame in every output format and decode it back
pub struct CodecCheck;

impl HealthCheck for CodecCheck {
    fn check(&self) -> CheckResult {
        let start = Instant::now();
        let sample = FrameSequence::single(Frame::still(RgbImage::new(2, 2)));

        for format in [OutputFormat::Gif, OutputFormat::Jpeg] {
            let round_trip = encode(&sample, format, &EncodeOptions::default())
                .map_err(|e| e.to_string())
                .and_then(|bytes| extract(&bytes).map_err(|e| e.to_string()));
            match round_trip {
                Ok(decoded) if decoded.dimensions() == (2, 2) => {}
                Ok(decoded) => {
                    return CheckResult::unhealthy(
                        "codecs",
                        format!("{format} round trip changed size to {:?}", decoded.dimensions()),
                    )
                    .with_duration(start.elapsed());
                }
                Err(e) => {
                    return CheckResult::unhealthy("codecs", format!("{format} round trip failed: {e}"))
                        .with_duration(start.elapsed());
                }
            }
        }

        CheckResult::healthy("codecs")
            .with_detail("formats", "gif,jpeg")
            .with_duration(start.elapsed())
    }
}

/// Check whether a TrueType font can be loaded for overlays
pub struct FontCheck {
    font_path: Option<PathBuf>,
    size: f32,
}

impl FontCheck {
    /// Check the configured font path (and the system fallbacks)
    pub fn new(font_path: Option<PathBuf>, size: f32) -> Self {
        Self { font_path, size }
    }
}

impl HealthCheck for FontCheck {
    fn check(&self) -> CheckResult {
        let start = Instant::now();
        let face = Typeface::load(self.font_path.as_deref(), self.size);

        let result = if face.is_scalable() {
            CheckResult::healthy("font")
        } else {
            CheckResult::degraded("font", "No TrueType font found, overlays use the built-in bitmap font")
        };
        let result = match &self.font_path {
            Some(path) => result.with_detail("configured", path.display().to_string()),
            None => result,
        };
        result.with_duration(start.elapsed())
    }
}

/// Re-run configuration validation
pub struct ConfigCheck {
    schema: ConfigSchema,
}

impl ConfigCheck {
    /// Check `schema`
    pub fn new(schema: ConfigSchema) -> Self {
        Self { schema }
    }
}

impl HealthCheck for ConfigCheck {
    fn check(&self) -> CheckResult {
        match self.schema.validate() {
            Ok(()) => CheckResult::healthy("config")
                .with_detail("bind", &self.schema.server.bind)
                .with_detail("timing", format!("{:?}", self.schema.pipeline.timing)),
            Err(e) => CheckResult::unhealthy("config", e.message),
        }
    }
}

/// Check that a directory exists and, optionally, accepts writes
pub struct PathCheck {
    path: PathBuf,
    check_writable: bool,
}

impl PathCheck {
    /// Create a check for a readable path
    pub fn readable(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            check_writable: false,
        }
    }

    /// Create a check for a writable path
    pub fn writable(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            check_writable: true,
        }
    }
}

impl HealthCheck for PathCheck {
    fn check(&self) -> CheckResult {
        let path: &Path = &self.path;
        let name = "output_dir";

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                return CheckResult::unhealthy(name, format!("{}: {}", path.display(), e))
                    .with_detail("path", path.display().to_string());
            }
        };

        if self.check_writable && metadata.permissions().readonly() {
            return CheckResult::unhealthy(name, format!("{} is read-only", path.display()));
        }

        CheckResult::healthy(name)
            .with_detail("path", path.display().to_string())
            .with_detail("writable", self.check_writable.to_string())
    }
}
