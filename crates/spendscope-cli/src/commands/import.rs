//! Receipt email import command
//!
//! Reads a JSON array of messages, either flattened
//! (`{"id", "subject", "from", "date", "body", "snippet"}`) or as Gmail API
//! `messages.get` payloads, and imports them into the session's store.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use spendscope_core::{import_messages, AIClient, EmailMessage, GmailMessage};

use super::{print_json, truncate, Session};

/// Parse a message file in either supported shape
pub fn read_messages(path: &Path) -> Result<Vec<EmailMessage>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("Message file is not valid JSON")?;

    let is_gmail = value
        .as_array()
        .and_then(|a| a.first())
        .is_some_and(|m| m.get("payload").is_some());

    if is_gmail {
        let raw: Vec<GmailMessage> =
            serde_json::from_value(value).context("Invalid Gmail message list")?;
        raw.iter()
            .map(|m| EmailMessage::from_gmail(m).context("Failed to decode Gmail message"))
            .collect()
    } else {
        serde_json::from_value(value).context("Invalid message list")
    }
}

pub async fn cmd_import_email(session: &Session, file: &Path, no_categorize: bool) -> Result<()> {
    let messages = read_messages(file)?;
    if !session.json {
        println!("📥 Importing {} messages from {}...", messages.len(), file.display());
    }

    let ai = if no_categorize {
        None
    } else {
        session.config.ai_client()
    };
    if ai.is_some() && !session.json {
        println!("   🤖 Auto-categorizing with the configured AI backend");
    }
    let registry = session.registry(false)?;

    let summary = import_messages::<AIClient>(
        &session.store,
        session.user.id,
        &messages,
        ai.as_ref(),
        &registry,
        Local::now().date_naive(),
        session.config.insights.timeout,
    )
    .await
    .context("Import failed")?;

    if session.json {
        return print_json(&summary);
    }

    for expense in &summary.expenses {
        println!(
            "   + {}  {:<30} {:>10}  {}",
            expense.date,
            truncate(&expense.description, 30),
            expense.amount.to_string(),
            expense.category.as_deref().unwrap_or("uncategorized")
        );
    }
    println!();
    println!("✅ Imported {} new expenses", summary.new_expenses);
    if summary.duplicates_skipped > 0 {
        println!("   Skipped {} already imported", summary.duplicates_skipped);
    }
    if summary.without_amount > 0 {
        println!("   Skipped {} without an amount", summary.without_amount);
    }
    println!("   (dry run: the snapshot is not modified)");

    Ok(())
}
