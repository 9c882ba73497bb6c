//! Terminal helpers for the gifsmith CLI
//!
//! - Status lines and health report rendering
//! - Size, duration and frame timing formatting
//! - Spinners for work that has no natural progress count

#![warn(missing_docs)]

pub mod output;
pub mod progress;
