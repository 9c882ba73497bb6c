//! Terminal output utilities
//!
//! Status lines go to stderr so stdout only carries command results.

use gifsmith_core::health::{HealthReport, HealthStatus};
use owo_colors::OwoColorize;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        eprintln!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print one line per health check and the overall verdict
    pub fn health(report: &HealthReport) {
        Self::header("gifsmith health");
        for check in &report.checks {
            let mark = match check.status {
                HealthStatus::Healthy => "✓".green().to_string(),
                HealthStatus::Degraded => "⚠".yellow().to_string(),
                HealthStatus::Unhealthy => "✗".red().to_string(),
            };
            match &check.message {
                Some(message) => println!("{mark} {} {}", check.name.bold(), message.dimmed()),
                None => println!("{mark} {}", check.name.bold()),
            }
        }
        println!();
        println!(
            "{} ({})",
            format!("{:?}", report.status).to_lowercase().bold(),
            format_duration(std::time::Duration::from_millis(report.total_duration_ms))
        );
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Summarize frame durations, collapsing runs: `100ms x3, 200ms`
pub fn format_delays(delays_ms: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = delays_ms.iter().peekable();
    while let Some(&delay) = iter.next() {
        let mut run = 1;
        while iter.peek() == Some(&&delay) {
            iter.next();
            run += 1;
        }
        if run == 1 {
            parts.push(format!("{delay}ms"));
        } else {
            parts.push(format!("{delay}ms x{run}"));
        }
    }
    parts.join(", ")
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
