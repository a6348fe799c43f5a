//! Template-based insight selection
//!
//! A small fixed set of message templates. Each template renders only when
//! every fact it quotes is present in the [`InsightInput`]; a
//! [`SelectionStrategy`] picks one of the templates that rendered. The
//! strategy decides which message appears, never the numbers in it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::{Audience, InsightInput};

/// Fixed insight message templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTemplate {
    TopCategory,
    DailyAverage,
    AverageTransaction,
    WeekOverWeek,
    MonthOverMonth,
    CategorySpread,
    HouseholdTotal,
}

impl InsightTemplate {
    pub const ALL: [InsightTemplate; 7] = [
        InsightTemplate::TopCategory,
        InsightTemplate::DailyAverage,
        InsightTemplate::AverageTransaction,
        InsightTemplate::WeekOverWeek,
        InsightTemplate::MonthOverMonth,
        InsightTemplate::CategorySpread,
        InsightTemplate::HouseholdTotal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightTemplate::TopCategory => "top_category",
            InsightTemplate::DailyAverage => "daily_average",
            InsightTemplate::AverageTransaction => "average_transaction",
            InsightTemplate::WeekOverWeek => "week_over_week",
            InsightTemplate::MonthOverMonth => "month_over_month",
            InsightTemplate::CategorySpread => "category_spread",
            InsightTemplate::HouseholdTotal => "household_total",
        }
    }

    /// Render against `input`, or `None` if a needed fact is missing
    pub fn render(&self, input: &InsightInput) -> Option<String> {
        if input.is_empty() {
            return None;
        }
        let period = input.period.as_str();
        match self {
            InsightTemplate::TopCategory => {
                let top = input.categories.first()?;
                Some(format!(
                    "{} is your biggest category this {} at {} ({:.1}% of spending).",
                    top.name, period, top.amount, top.percentage
                ))
            }
            InsightTemplate::DailyAverage => Some(format!(
                "You're averaging {} per day this {}.",
                input.average_daily, period
            )),
            InsightTemplate::AverageTransaction => Some(format!(
                "Your average purchase is {} across {} transactions.",
                input.average_transaction, input.transaction_count
            )),
            InsightTemplate::WeekOverWeek => {
                let change = input.week_over_week_change()?;
                Some(format!(
                    "Spending is {} {:.1}% compared with the previous week.",
                    direction(change),
                    change.abs()
                ))
            }
            InsightTemplate::MonthOverMonth => {
                let change = input.month_over_month_change()?;
                Some(format!(
                    "Spending is {} {:.1}% compared with last month.",
                    direction(change),
                    change.abs()
                ))
            }
            InsightTemplate::CategorySpread => {
                if input.categories.len() < 2 {
                    return None;
                }
                Some(format!(
                    "Your spending this {} is spread across {} categories.",
                    period,
                    input.categories.len()
                ))
            }
            InsightTemplate::HouseholdTotal => {
                if input.audience != Audience::Household {
                    return None;
                }
                Some(format!(
                    "Together you've spent {} this {}.",
                    input.total, period
                ))
            }
        }
    }
}

fn direction(change: f64) -> &'static str {
    if change >= 0.0 {
        "up"
    } else {
        "down"
    }
}

/// A rendered template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub template: InsightTemplate,
    pub message: String,
}

/// Every template that renders for `input`, in declaration order
pub fn eligible_insights(input: &InsightInput) -> Vec<Insight> {
    InsightTemplate::ALL
        .iter()
        .filter_map(|template| {
            template.render(input).map(|message| Insight {
                template: *template,
                message,
            })
        })
        .collect()
}

/// Chooses one of `count` eligible templates
pub trait SelectionStrategy: Send {
    /// Return an index in `0..count`; only called with `count > 0`
    fn choose(&mut self, count: usize) -> usize;
}

/// Pseudo-random choice from a seeded generator
///
/// The same seed yields the same sequence of choices.
pub struct SeededStrategy {
    rng: StdRng,
}

impl SeededStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy (non-reproducible)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl SelectionStrategy for SeededStrategy {
    fn choose(&mut self, count: usize) -> usize {
        self.rng.gen_range(0..count)
    }
}

/// Always picks index `n` (modulo the eligible count)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStrategy(pub usize);

impl SelectionStrategy for FixedStrategy {
    fn choose(&mut self, count: usize) -> usize {
        self.0 % count
    }
}

/// Picks a single insight for an input
pub fn select_insight(input: &InsightInput, strategy: &mut dyn SelectionStrategy) -> Option<Insight> {
    let mut eligible = eligible_insights(input);
    if eligible.is_empty() {
        return None;
    }
    let index = strategy.choose(eligible.len()).min(eligible.len() - 1);
    tracing::debug!(
        eligible = eligible.len(),
        template = eligible[index].template.as_str(),
        "Selected insight template"
    );
    Some(eligible.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::types::InsightWindow;
    use crate::models::{Money, TimePeriod};
    use crate::registry::{builtin_categories, CategoryRegistry};
    use crate::test_utils::expense_on;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_input(audience: Audience) -> InsightInput {
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        let expenses = vec![
            expense_on(date(2025, 2, 3), 3000, Some("Groceries")),
            expense_on(date(2025, 2, 11), 1000, Some("Travel")),
            expense_on(date(2025, 1, 5), 8000, Some("Travel")),
        ];
        InsightInput::from_expenses(
            &expenses,
            &registry,
            TimePeriod::Month,
            date(2025, 2, 12),
            audience,
            InsightWindow::default(),
        )
    }

    #[test]
    fn test_all_templates_eligible_with_full_input() {
        let eligible = eligible_insights(&sample_input(Audience::Household));
        assert_eq!(eligible.len(), InsightTemplate::ALL.len());
    }

    #[test]
    fn test_household_template_needs_household() {
        let eligible = eligible_insights(&sample_input(Audience::Individual));
        assert!(eligible
            .iter()
            .all(|i| i.template != InsightTemplate::HouseholdTotal));
    }

    #[test]
    fn test_empty_input_has_no_insights() {
        let mut input = sample_input(Audience::Individual);
        input.transaction_count = 0;
        assert!(eligible_insights(&input).is_empty());
        assert!(select_insight(&input, &mut FixedStrategy(0)).is_none());
    }

    #[test]
    fn test_numbers_come_from_input() {
        let input = sample_input(Audience::Individual);
        let top = InsightTemplate::TopCategory.render(&input).unwrap();
        assert_eq!(
            top,
            "Groceries is your biggest category this month at $30.00 (75.0% of spending)."
        );
        let avg = InsightTemplate::AverageTransaction.render(&input).unwrap();
        assert_eq!(avg, "Your average purchase is $20.00 across 2 transactions.");
        let mom = InsightTemplate::MonthOverMonth.render(&input).unwrap();
        assert_eq!(mom, "Spending is down 50.0% compared with last month.");
        assert_eq!(input.total, Money::from_cents(4000));
    }

    #[test]
    fn test_fixed_strategy_wraps() {
        let input = sample_input(Audience::Individual);
        let count = eligible_insights(&input).len();
        let first = select_insight(&input, &mut FixedStrategy(0)).unwrap();
        let wrapped = select_insight(&input, &mut FixedStrategy(count)).unwrap();
        assert_eq!(first, wrapped);
        assert_eq!(first.template, InsightTemplate::TopCategory);
    }

    #[test]
    fn test_same_seed_same_message() {
        let input = sample_input(Audience::Household);
        let a: Vec<Insight> = {
            let mut strategy = SeededStrategy::new(42);
            (0..5)
                .filter_map(|_| select_insight(&input, &mut strategy))
                .collect()
        };
        let b: Vec<Insight> = {
            let mut strategy = SeededStrategy::new(42);
            (0..5)
                .filter_map(|_| select_insight(&input, &mut strategy))
                .collect()
        };
        assert_eq!(a, b);
    }
}
