//! Dashboard, category breakdown, and trend commands

use anyhow::Result;
use spendscope_core::aggregate::{category_totals, filter_by_period, monthly_trend};
use spendscope_core::{dashboard_stats, Money};

use super::{bar, parse_date, parse_period, print_json, truncate, Session};

pub async fn cmd_dashboard(
    session: &Session,
    period: &str,
    date: Option<&str>,
    partner: bool,
) -> Result<()> {
    let period = parse_period(period)?;
    let reference = parse_date(date)?;
    let expenses = session.expenses(partner).await?;
    let registry = session.registry(partner)?;

    let stats = dashboard_stats(
        &expenses,
        &registry,
        period,
        reference,
        &session.config.dashboard,
    );

    if session.json {
        return print_json(&stats);
    }

    let whose = if partner { "Household" } else { "Personal" };
    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│     {:<8} dashboard ({:<7})          │", whose, period.as_str());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  This {}:      {:>12}", period, stats.total_this_period.to_string());
    println!("  All time:        {:>12}", stats.total_spent.to_string());
    println!("  Daily average:   {:>12}", stats.average_daily.to_string());
    println!("  Per expense:     {:>12}", stats.average_transaction.to_string());
    println!("  Expenses:        {:>12}", stats.transaction_count);
    println!();

    if stats.top_categories.is_empty() {
        println!("  No spending this {}.", period);
    } else {
        println!("  Top categories");
        for category in &stats.top_categories {
            println!(
                "    {:<20} {:>10}  {}",
                truncate(&category.name, 20),
                category.amount.to_string(),
                bar(category.percentage, 20)
            );
        }
    }
    println!();

    println!("  Recent");
    for expense in &stats.recent_expenses {
        println!(
            "    {}  {:<28} {:>10}",
            expense.date,
            truncate(&expense.description, 28),
            expense.amount.to_string()
        );
    }

    Ok(())
}

pub async fn cmd_categories(
    session: &Session,
    period: &str,
    date: Option<&str>,
    partner: bool,
) -> Result<()> {
    let period = parse_period(period)?;
    let reference = parse_date(date)?;
    let expenses = session.expenses(partner).await?;
    let registry = session.registry(partner)?;

    let in_period = filter_by_period(&expenses, period, reference);
    let totals = category_totals(in_period.iter().copied(), &registry);

    if session.json {
        return print_json(&totals);
    }

    if totals.is_empty() {
        println!("No spending in the {} containing {}.", period, reference);
        return Ok(());
    }

    let window = period.window(reference);
    println!();
    println!("📊 Spending by category ({} to {})", window.start, window.end);
    println!("   ─────────────────────────────────────────────────────");
    for category in &totals {
        println!(
            "   {:<20} {:>10}  {:>5.1}%  {:>3} expenses",
            truncate(&category.name, 20),
            category.amount.to_string(),
            category.percentage,
            category.count
        );
    }
    let total: Money = totals.iter().map(|c| c.amount).sum();
    println!("   ─────────────────────────────────────────────────────");
    println!("   {:<20} {:>10}", "Total", total.to_string());

    Ok(())
}

pub async fn cmd_trend(
    session: &Session,
    months: usize,
    date: Option<&str>,
    partner: bool,
) -> Result<()> {
    let reference = parse_date(date)?;
    let expenses = session.expenses(partner).await?;
    let trend = monthly_trend(&expenses, months, reference);

    if session.json {
        return print_json(&trend);
    }

    let peak = trend.iter().map(|m| m.amount).max().unwrap_or(Money::ZERO);
    println!();
    println!("📈 Monthly spending");
    for month in &trend {
        println!(
            "   {} {}  {:>10}  {}",
            month.label,
            &month.month[..4],
            month.amount.to_string(),
            bar(month.amount.percent_of(peak), 30)
        );
    }

    Ok(())
}
