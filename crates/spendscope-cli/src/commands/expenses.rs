//! Expense listing command

use anyhow::Result;
use spendscope_core::aggregate::recent_expenses;

use super::{print_json, truncate, Session};

pub async fn cmd_expenses(session: &Session, limit: usize, partner: bool) -> Result<()> {
    let expenses = session.expenses(partner).await?;
    let recent = recent_expenses(&expenses, limit);

    if session.json {
        return print_json(&recent);
    }

    if recent.is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    let partner_id = if partner {
        session.partner()?.map(|p| p.id)
    } else {
        None
    };

    println!();
    println!(
        "{:<10}  {:<30} {:<18} {:>10}",
        "Date", "Description", "Category", "Amount"
    );
    println!("{}", "─".repeat(72));
    for expense in &recent {
        let marker = if Some(expense.user_id) == partner_id {
            " (partner)"
        } else {
            ""
        };
        println!(
            "{}  {:<30} {:<18} {:>10}{}",
            expense.date,
            truncate(&expense.description, 30),
            truncate(expense.category.as_deref().unwrap_or("-"), 18),
            expense.amount.to_string(),
            marker
        );
    }
    println!();
    println!("Showing {} of {} expenses", recent.len(), expenses.len());

    Ok(())
}
