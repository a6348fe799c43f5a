//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spendscope_core::aggregate::MAX_TREND_MONTHS;

/// Spendscope - See where the money goes
#[derive(Parser)]
#[command(name = "spendscope")]
#[command(about = "Personal and household expense dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON snapshot to load (built-in sample data when omitted)
    ///
    /// The snapshot is read once at startup and never written back.
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Email of the user to act as (defaults to the sample user)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Config file (defaults to $SPENDSCOPE_CONFIG, then ~/.config/spendscope/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dashboard statistics for a period
    Dashboard {
        /// Period: week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        period: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Include the linked partner's expenses
        #[arg(long)]
        partner: bool,
    },

    /// Show the spending breakdown by category
    Categories {
        /// Period: week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        period: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Include the linked partner's expenses
        #[arg(long)]
        partner: bool,
    },

    /// Show monthly spending totals
    Trend {
        /// Number of months (including the current one, at most 1200)
        #[arg(
            short,
            long,
            default_value = "6",
            value_parser = clap::value_parser!(u16).range(1..=MAX_TREND_MONTHS as i64)
        )]
        months: u16,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Include the linked partner's expenses
        #[arg(long)]
        partner: bool,
    },

    /// List recent expenses
    Expenses {
        /// Number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Include the linked partner's expenses
        #[arg(long)]
        partner: bool,
    },

    /// Compare my spending with my partner's
    Compare {
        /// Period: week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        period: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Generate spending insights
    Insights {
        /// Period: week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        period: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Seed for template selection (same seed, same insight)
        #[arg(long)]
        seed: Option<u64>,

        /// Use the configured AI backend instead of templates
        #[arg(long)]
        ai: bool,

        /// Analyze the household (both partners)
        #[arg(long)]
        partner: bool,
    },

    /// Extract expenses from exported receipt emails (dry run, nothing is saved)
    ///
    /// Expenses are added to this run's in-memory store only; the --data
    /// snapshot is never written back. Use --json to capture the result.
    ImportEmail {
        /// JSON file of messages (flattened or Gmail API format)
        #[arg(short, long)]
        file: PathBuf,

        /// Skip AI categorization of imported expenses
        #[arg(long)]
        no_categorize: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
