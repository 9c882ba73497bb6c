//! Configuration loading and schema definitions
//!
//! One TOML file with `[pipeline]`, `[overlay]`, `[server]` and
//! `[telemetry]` tables, every field optional.

mod loader;
mod schema;

pub use loader::{Config, ENV_BIND, ENV_FONT, ENV_LOG};
pub use schema::*;
