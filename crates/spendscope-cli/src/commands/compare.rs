//! Partner comparison command

use anyhow::{bail, Result};
use spendscope_core::{compare_expenses, ExpenseStore};

use super::{bar, parse_date, parse_period, print_json, truncate, Session};

pub async fn cmd_compare(session: &Session, period: &str, date: Option<&str>) -> Result<()> {
    let period = parse_period(period)?;
    let reference = parse_date(date)?;

    let Some(partner) = session.partner()? else {
        bail!("No partner linked. Invite one from the web dashboard first.");
    };

    let mine = session.expenses(false).await?;
    let theirs = session.store.expenses_for(partner.id, false).await?;
    let registry = session.registry(true)?;

    let comparison = compare_expenses(&mine, &theirs, &registry, period, reference);

    if session.json {
        return print_json(&comparison);
    }

    let partner_name = partner.name.as_deref().unwrap_or(&partner.email);
    let totals = &comparison.totals;
    println!();
    println!("👥 You vs {} (this {})", partner_name, period);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   You          {:>10}  {:>5.1}%  {}",
        totals.mine.total.to_string(),
        totals.mine.rounded_percentage(),
        bar(totals.mine.percentage, 20)
    );
    println!(
        "   {:<12} {:>10}  {:>5.1}%  {}",
        truncate(partner_name, 12),
        totals.partner.total.to_string(),
        totals.partner.rounded_percentage(),
        bar(totals.partner.percentage, 20)
    );
    println!("   Combined     {:>10}", totals.combined.total.to_string());
    println!();

    for category in &comparison.categories {
        let split = &category.comparison;
        println!(
            "   {:<20} you {:>9}  {} {:>9}",
            truncate(&category.name, 20),
            split.mine.total.to_string(),
            truncate(partner_name, 8),
            split.partner.total.to_string()
        );
    }

    Ok(())
}
