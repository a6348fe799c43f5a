//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared session setup (config, store, acting user) and argument parsing
//! - `dashboard` - Dashboard, category breakdown, and monthly trend
//! - `expenses` - Recent expense listing
//! - `compare` - Partner comparison
//! - `insights` - Insight reports (templated or generated)
//! - `import` - Receipt email import
//! - `serve` - Web server command

pub mod compare;
pub mod core;
pub mod dashboard;
pub mod expenses;
pub mod import;
pub mod insights;
pub mod serve;

// Re-export command functions for main.rs
pub use compare::*;
pub use core::*;
pub use dashboard::*;
pub use expenses::*;
pub use import::*;
pub use insights::*;
pub use serve::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Horizontal bar proportional to `percentage` (0-100)
pub fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
