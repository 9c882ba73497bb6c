//! Shared plumbing for gifsmith binaries
//!
//! - **Error handling**: coded errors with context and recovery suggestions
//! - **Configuration**: TOML settings with defaults, env overrides and validation
//! - **Health checks**: codec self-test, font availability, config sanity
//!
//! # Example
//!
//! ```rust,no_run
//! use gifsmith_core::{config::Config, health::HealthChecker};
//!
//! let config = Config::load(None).expect("valid configuration");
//! let report = HealthChecker::new()
//!     .with_standard_checks(&config.schema)
//!     .run();
//!
//! if !report.is_healthy() {
//!     eprintln!("Environment issues detected!");
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod health;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, ServerConfig};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::health::{HealthChecker, HealthReport, HealthStatus};
}
