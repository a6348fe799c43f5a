//! Expense aggregation engine
//!
//! Pure functions over an expense snapshot. Nothing here performs I/O or
//! fails: empty input yields zero-valued results.

use std::collections::HashMap;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{
    CategoryTotal, DashboardStats, Expense, Money, MonthlyTotal, TimePeriod, WeeklyTotal,
};
use crate::period::{month_start, week_start};
use crate::registry::CategoryRegistry;

/// Longest monthly trend produced (a century)
pub const MAX_TREND_MONTHS: usize = 1200;

/// Longest weekly trend produced
pub const MAX_TREND_WEEKS: usize = 5200;

/// Sizes of the list sections of a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    pub trend_months: usize,
    pub recent_limit: usize,
    pub top_categories: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            trend_months: 6,
            recent_limit: 10,
            top_categories: 5,
        }
    }
}

/// Sum of all amounts
pub fn total_spent<'a, I>(expenses: I) -> Money
where
    I: IntoIterator<Item = &'a Expense>,
{
    expenses.into_iter().map(|e| e.amount).sum()
}

/// Expenses dated inside the `period` window containing `reference`, in input order
pub fn filter_by_period(
    expenses: &[Expense],
    period: TimePeriod,
    reference: NaiveDate,
) -> Vec<&Expense> {
    let window = period.window(reference);
    expenses
        .iter()
        .filter(|e| window.contains(e.date))
        .collect()
}

/// Windowed total spread over every calendar day of the window
pub fn daily_average(expenses: &[Expense], period: TimePeriod, reference: NaiveDate) -> Money {
    let window = period.window(reference);
    let total = total_spent(expenses.iter().filter(|e| window.contains(e.date)));
    total.div_round(window.days())
}

/// Mean amount per expense
pub fn average_transaction<'a, I>(expenses: I) -> Money
where
    I: IntoIterator<Item = &'a Expense>,
{
    let (total, count) = expenses
        .into_iter()
        .fold((Money::ZERO, 0i64), |(sum, n), e| (sum + e.amount, n + 1));
    total.div_round(count)
}

/// Per-category breakdown, largest first
///
/// Expenses without a known category are counted under the registry's
/// fallback bucket, so the amounts always add up to [`total_spent`].
pub fn category_totals<'a, I>(expenses: I, registry: &CategoryRegistry) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut sums: HashMap<&str, (Money, usize)> = HashMap::new();
    let mut total = Money::ZERO;

    for expense in expenses {
        let category = registry.resolve(expense.category.as_deref());
        let entry = sums.entry(category.name.as_str()).or_insert((Money::ZERO, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
        total += expense.amount;
    }

    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .filter(|(_, (amount, _))| !amount.is_zero())
        .filter_map(|(name, (amount, count))| {
            registry.get(name).map(|category| CategoryTotal {
                name: category.name.clone(),
                color: category.color.clone(),
                icon: category.icon.clone(),
                amount,
                count,
                percentage: amount.percent_of(total),
            })
        })
        .collect();

    totals.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    totals
}

/// Totals for the last `month_count` calendar months ending at `reference`'s month
///
/// Oldest month first. Months without spending are included with zero. The
/// count is capped at [`MAX_TREND_MONTHS`] and stops early at the calendar's
/// lower limit.
pub fn monthly_trend(
    expenses: &[Expense],
    month_count: usize,
    reference: NaiveDate,
) -> Vec<MonthlyTotal> {
    let mut starts: Vec<NaiveDate> = std::iter::successors(Some(month_start(reference)), |start| {
        start.checked_sub_months(Months::new(1))
    })
    .take(month_count.min(MAX_TREND_MONTHS))
    .collect();
    starts.reverse();

    let mut sums: HashMap<NaiveDate, Money> = starts.iter().map(|&s| (s, Money::ZERO)).collect();
    for expense in expenses {
        if let Some(sum) = sums.get_mut(&month_start(expense.date)) {
            *sum += expense.amount;
        }
    }

    starts
        .into_iter()
        .map(|start| MonthlyTotal {
            month: start.format("%Y-%m").to_string(),
            label: start.format("%b").to_string(),
            amount: sums.get(&start).copied().unwrap_or_default(),
        })
        .collect()
}

/// Totals for the last `week_count` ISO weeks ending at `reference`'s week
///
/// Capped at [`MAX_TREND_WEEKS`] like [`monthly_trend`].
pub fn weekly_trend(
    expenses: &[Expense],
    week_count: usize,
    reference: NaiveDate,
) -> Vec<WeeklyTotal> {
    let mut starts: Vec<NaiveDate> = std::iter::successors(Some(week_start(reference)), |start| {
        start.checked_sub_signed(Duration::weeks(1))
    })
    .take(week_count.min(MAX_TREND_WEEKS))
    .collect();
    starts.reverse();

    let mut sums: HashMap<NaiveDate, Money> = starts.iter().map(|&s| (s, Money::ZERO)).collect();
    for expense in expenses {
        if let Some(sum) = sums.get_mut(&week_start(expense.date)) {
            *sum += expense.amount;
        }
    }

    starts
        .into_iter()
        .map(|week_start| WeeklyTotal {
            week_start,
            amount: sums.get(&week_start).copied().unwrap_or_default(),
        })
        .collect()
}

/// Newest expenses first; equal dates keep input order
pub fn recent_expenses(expenses: &[Expense], limit: usize) -> Vec<Expense> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Assemble the dashboard for one period window
pub fn dashboard_stats(
    expenses: &[Expense],
    registry: &CategoryRegistry,
    period: TimePeriod,
    reference: NaiveDate,
    options: &DashboardOptions,
) -> DashboardStats {
    let in_period = filter_by_period(expenses, period, reference);
    let window = period.window(reference);
    let total_this_period = total_spent(in_period.iter().copied());

    let mut top_categories = category_totals(in_period.iter().copied(), registry);
    top_categories.truncate(options.top_categories);

    tracing::debug!(
        period = %period,
        reference = %reference,
        expenses = expenses.len(),
        in_period = in_period.len(),
        "Computed dashboard stats"
    );

    DashboardStats {
        period,
        reference_date: reference,
        total_spent: total_spent(expenses),
        total_this_period,
        average_daily: total_this_period.div_round(window.days()),
        average_transaction: average_transaction(in_period.iter().copied()),
        transaction_count: in_period.len(),
        top_categories,
        monthly_trend: monthly_trend(expenses, options.trend_months, reference),
        recent_expenses: recent_expenses(expenses, options.recent_limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{builtin_categories, FALLBACK_CATEGORY};
    use crate::test_utils::expense_on;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn registry() -> CategoryRegistry {
        CategoryRegistry::from_specs(&builtin_categories())
    }

    #[test]
    fn test_total_spent_empty_is_zero() {
        assert_eq!(total_spent(&[] as &[Expense]), Money::ZERO);
    }

    #[test]
    fn test_filter_by_month_boundaries() {
        let expenses = vec![
            expense_on(date(2025, 1, 31), 1000, None),
            expense_on(date(2025, 2, 1), 2000, None),
            expense_on(date(2025, 2, 28), 3000, None),
            expense_on(date(2025, 3, 1), 4000, None),
        ];
        let filtered = filter_by_period(&expenses, TimePeriod::Month, date(2025, 2, 15));
        let dates: Vec<NaiveDate> = filtered.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 2, 1), date(2025, 2, 28)]);
    }

    #[test]
    fn test_daily_average_uses_calendar_days() {
        // 28 days in Feb 2025: 2800 cents -> 100 per day
        let expenses = vec![expense_on(date(2025, 2, 3), 2800, None)];
        assert_eq!(
            daily_average(&expenses, TimePeriod::Month, date(2025, 2, 10)),
            Money::from_cents(100)
        );
        // Week of 2025-02-03: 2800 / 7 = 400
        assert_eq!(
            daily_average(&expenses, TimePeriod::Week, date(2025, 2, 9)),
            Money::from_cents(400)
        );
        assert_eq!(
            daily_average(&[], TimePeriod::Month, date(2025, 2, 10)),
            Money::ZERO
        );
    }

    #[test]
    fn test_average_transaction_rounds() {
        let expenses = vec![
            expense_on(date(2025, 2, 1), 100, None),
            expense_on(date(2025, 2, 2), 100, None),
            expense_on(date(2025, 2, 3), 101, None),
        ];
        assert_eq!(average_transaction(&expenses), Money::from_cents(100));
        assert_eq!(average_transaction(&[] as &[Expense]), Money::ZERO);
    }

    #[test]
    fn test_category_totals_sum_invariant() {
        let expenses = vec![
            expense_on(date(2025, 2, 1), 1234, Some("Groceries")),
            expense_on(date(2025, 2, 2), 999, Some("Travel")),
            expense_on(date(2025, 2, 3), 501, None),
            expense_on(date(2025, 2, 4), 77, Some("Not A Category")),
            expense_on(date(2025, 2, 5), 0, Some("Shopping")),
        ];
        let totals = category_totals(&expenses, &registry());
        let sum: Money = totals.iter().map(|t| t.amount).sum();
        assert_eq!(sum, total_spent(&expenses));

        let other = totals.iter().find(|t| t.name == FALLBACK_CATEGORY).unwrap();
        assert_eq!(other.amount, Money::from_cents(578));
        assert_eq!(other.count, 2);

        // Zero-total categories are dropped
        assert!(totals.iter().all(|t| t.name != "Shopping"));
    }

    #[test]
    fn test_category_totals_ordering_ties_by_name() {
        let expenses = vec![
            expense_on(date(2025, 2, 1), 5000, Some("Food & Dining")),
            expense_on(date(2025, 2, 2), 5000, Some("Bills & Utilities")),
            expense_on(date(2025, 2, 3), 9000, Some("Travel")),
        ];
        let names: Vec<String> = category_totals(&expenses, &registry())
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Travel", "Bills & Utilities", "Food & Dining"]);
    }

    #[test]
    fn test_category_percentages() {
        let expenses = vec![
            expense_on(date(2025, 2, 1), 3000, Some("Travel")),
            expense_on(date(2025, 2, 2), 1000, Some("Groceries")),
        ];
        let totals = category_totals(&expenses, &registry());
        assert_eq!(totals[0].percentage, 75.0);
        assert_eq!(totals[1].percentage, 25.0);
        assert!(category_totals(&[] as &[Expense], &registry()).is_empty());
    }

    #[test]
    fn test_monthly_trend_includes_empty_months() {
        let reference = date(2025, 6, 15);
        let expenses = vec![
            expense_on(date(2025, 1, 10), 100, None),
            expense_on(date(2025, 2, 10), 200, None),
            expense_on(date(2025, 4, 10), 400, None),
            expense_on(date(2025, 5, 10), 500, None),
            expense_on(date(2025, 6, 10), 600, None),
            expense_on(date(2024, 12, 31), 999, None),
        ];
        let trend = monthly_trend(&expenses, 6, reference);
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[0].month, "2025-01");
        assert_eq!(trend[0].label, "Jan");
        assert_eq!(trend[2].month, "2025-03");
        assert_eq!(trend[2].amount, Money::ZERO);
        assert_eq!(trend[5].amount, Money::from_cents(600));
    }

    #[test]
    fn test_monthly_trend_crosses_year() {
        let trend = monthly_trend(&[], 3, date(2025, 1, 5));
        let months: Vec<&str> = trend.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01"]);
        assert!(monthly_trend(&[], 0, date(2025, 1, 5)).is_empty());
    }

    #[test]
    fn test_weekly_trend() {
        let expenses = vec![
            expense_on(date(2025, 2, 10), 100, None),
            expense_on(date(2025, 2, 16), 50, None),
            expense_on(date(2025, 1, 27), 300, None),
        ];
        let trend = weekly_trend(&expenses, 3, date(2025, 2, 12));
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].week_start, date(2025, 1, 27));
        assert_eq!(trend[0].amount, Money::from_cents(300));
        assert_eq!(trend[1].amount, Money::ZERO);
        assert_eq!(trend[2].week_start, date(2025, 2, 10));
        assert_eq!(trend[2].amount, Money::from_cents(150));
    }

    #[test]
    fn test_trend_lengths_are_capped() {
        let months = monthly_trend(&[], 4_000_000, date(2025, 1, 1));
        assert_eq!(months.len(), MAX_TREND_MONTHS);
        assert_eq!(months[0].month, "1925-02");
        assert_eq!(months.last().unwrap().month, "2025-01");

        let weeks = weekly_trend(&[], usize::MAX, date(2025, 1, 1));
        assert_eq!(weeks.len(), MAX_TREND_WEEKS);
        assert_eq!(weeks.last().unwrap().week_start, date(2024, 12, 30));
    }

    #[test]
    fn test_monthly_trend_stops_at_calendar_limit() {
        let trend = monthly_trend(&[], 24, NaiveDate::MIN);
        assert_eq!(trend.len(), 1);
        assert!(trend[0].amount.is_zero());
        assert!(monthly_trend(&[], 0, date(2025, 1, 1)).is_empty());
    }

    #[test]
    fn test_recent_expenses_stable() {
        let mut a = expense_on(date(2025, 2, 1), 100, None);
        a.description = "first".into();
        let mut b = expense_on(date(2025, 2, 1), 200, None);
        b.description = "second".into();
        let c = expense_on(date(2025, 2, 5), 300, None);
        let recent = recent_expenses(&[a, b, c], 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, date(2025, 2, 5));
        assert_eq!(recent[1].description, "first");
    }

    #[test]
    fn test_dashboard_stats() {
        let expenses = vec![
            expense_on(date(2025, 2, 3), 2000, Some("Groceries")),
            expense_on(date(2025, 2, 4), 800, Some("Travel")),
            expense_on(date(2025, 1, 20), 5000, Some("Travel")),
        ];
        let options = DashboardOptions {
            top_categories: 1,
            ..Default::default()
        };
        let stats = dashboard_stats(
            &expenses,
            &registry(),
            TimePeriod::Month,
            date(2025, 2, 10),
            &options,
        );
        assert_eq!(stats.total_spent, Money::from_cents(7800));
        assert_eq!(stats.total_this_period, Money::from_cents(2800));
        assert_eq!(stats.average_daily, Money::from_cents(100));
        assert_eq!(stats.average_transaction, Money::from_cents(1400));
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(stats.top_categories.len(), 1);
        assert_eq!(stats.top_categories[0].name, "Groceries");
        assert_eq!(stats.monthly_trend.len(), 6);
        assert_eq!(stats.recent_expenses.len(), 3);
    }

    #[test]
    fn test_dashboard_stats_is_deterministic() {
        let expenses = vec![
            expense_on(date(2025, 2, 3), 2000, Some("Groceries")),
            expense_on(date(2025, 2, 4), 2000, Some("Travel")),
        ];
        let run = || {
            dashboard_stats(
                &expenses,
                &registry(),
                TimePeriod::Quarter,
                date(2025, 2, 10),
                &DashboardOptions::default(),
            )
        };
        assert_eq!(run(), run());
    }
}
