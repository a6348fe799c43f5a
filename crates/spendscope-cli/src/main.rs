//! Spendscope CLI - See where the money goes
//!
//! Usage:
//!   spendscope dashboard --period month     Dashboard for the current month
//!   spendscope categories --partner         Household category breakdown
//!   spendscope insights --seed 7            Templated insight (reproducible)
//!   spendscope import-email --file mail.json Import receipt emails
//!   spendscope serve --port 3000            Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let session = commands::open_session(
        cli.data.as_deref(),
        cli.user.as_deref(),
        cli.config.as_deref(),
        cli.json,
    )?;

    match cli.command {
        Commands::Dashboard {
            period,
            date,
            partner,
        } => commands::cmd_dashboard(&session, &period, date.as_deref(), partner).await,
        Commands::Categories {
            period,
            date,
            partner,
        } => commands::cmd_categories(&session, &period, date.as_deref(), partner).await,
        Commands::Trend {
            months,
            date,
            partner,
        } => {
            commands::cmd_trend(&session, usize::from(months), date.as_deref(), partner).await
        }
        Commands::Expenses { limit, partner } => {
            commands::cmd_expenses(&session, limit, partner).await
        }
        Commands::Compare { period, date } => {
            commands::cmd_compare(&session, &period, date.as_deref()).await
        }
        Commands::Insights {
            period,
            date,
            seed,
            ai,
            partner,
        } => {
            commands::cmd_insights(&session, &period, date.as_deref(), seed, ai, partner).await
        }
        Commands::ImportEmail {
            file,
            no_categorize,
        } => commands::cmd_import_email(&session, &file, no_categorize).await,
        Commands::Serve { port, host } => commands::cmd_serve(session, &host, port).await,
    }
}
