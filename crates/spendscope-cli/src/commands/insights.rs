//! Insights command

use anyhow::{bail, Result};
use spendscope_core::insights::SeededStrategy;
use spendscope_core::{Audience, InsightInput, InsightService, ReportStatus};

use super::{parse_date, parse_period, print_json, Session};

pub async fn cmd_insights(
    session: &Session,
    period: &str,
    date: Option<&str>,
    seed: Option<u64>,
    use_ai: bool,
    partner: bool,
) -> Result<()> {
    let period = parse_period(period)?;
    let reference = parse_date(date)?;

    let ai = if use_ai {
        match session.config.ai_client() {
            Some(client) => Some(client),
            None => bail!(
                "No AI backend configured. Set AI_BACKEND (and OPENAI_COMPATIBLE_HOST) or [insights] backend in the config."
            ),
        }
    } else {
        None
    };

    let mut service = InsightService::new(ai).with_timeout(session.config.insights.timeout);
    if let Some(seed) = seed.or(session.config.insights.seed) {
        service = service.with_strategy(SeededStrategy::new(seed));
    }

    let household = partner && session.partner()?.is_some();
    let audience = if household {
        Audience::Household
    } else {
        Audience::Individual
    };
    let expenses = session.expenses(household).await?;
    let registry = session.registry(household)?;
    let input = InsightInput::from_expenses(
        &expenses,
        &registry,
        period,
        reference,
        audience,
        session.config.insights.window,
    );

    let report = service.analyze(&input).await;

    if session.json {
        return print_json(&report);
    }

    println!();
    match report.status {
        ReportStatus::Generated => println!("🤖 {}", report.summary),
        ReportStatus::Unavailable => println!("⚠️  {}", report.summary),
        ReportStatus::Templated | ReportStatus::Empty => println!("💡 {}", report.summary),
    }

    if !report.insights.is_empty() {
        println!();
        println!("   Insights");
        for insight in &report.insights {
            println!("   • {}", insight);
        }
    }
    if !report.recommendations.is_empty() {
        println!();
        println!("   Recommendations");
        for recommendation in &report.recommendations {
            println!("   • {}", recommendation);
        }
    }

    Ok(())
}
