//! Core types for insight generation

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    average_transaction, category_totals, filter_by_period, monthly_trend, total_spent,
    weekly_trend,
};
use crate::models::{CategoryTotal, Expense, Money, MonthlyTotal, TimePeriod, WeeklyTotal};
use crate::registry::CategoryRegistry;

/// Whose spending an analysis describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    Individual,
    /// Both partners' expenses merged
    Household,
}

impl Audience {
    /// Phrase used in prompts
    pub fn describe(&self) -> &'static str {
        match self {
            Audience::Individual => "an individual",
            Audience::Household => "a household (two partners)",
        }
    }
}

/// Sizes of the trend series fed into an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightWindow {
    pub trend_months: usize,
    pub trend_weeks: usize,
}

impl Default for InsightWindow {
    fn default() -> Self {
        Self {
            trend_months: 6,
            trend_weeks: 12,
        }
    }
}

/// Aggregated facts an insight may draw on
///
/// Holds no raw expenses: every number an insight states comes from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightInput {
    pub period: TimePeriod,
    pub reference_date: NaiveDate,
    pub audience: Audience,
    pub total: Money,
    pub transaction_count: usize,
    pub average_daily: Money,
    pub average_transaction: Money,
    /// Largest first
    pub categories: Vec<CategoryTotal>,
    /// Oldest first
    pub monthly_trend: Vec<MonthlyTotal>,
    /// Oldest first
    pub weekly_trend: Vec<WeeklyTotal>,
}

impl InsightInput {
    /// Aggregate `expenses` over the `period` window containing `reference`
    pub fn from_expenses(
        expenses: &[Expense],
        registry: &CategoryRegistry,
        period: TimePeriod,
        reference: NaiveDate,
        audience: Audience,
        window: InsightWindow,
    ) -> Self {
        let in_period = filter_by_period(expenses, period, reference);
        let total = total_spent(in_period.iter().copied());

        Self {
            period,
            reference_date: reference,
            audience,
            total,
            transaction_count: in_period.len(),
            average_daily: total.div_round(period.window(reference).days()),
            average_transaction: average_transaction(in_period.iter().copied()),
            categories: category_totals(in_period.iter().copied(), registry),
            monthly_trend: monthly_trend(expenses, window.trend_months, reference),
            weekly_trend: weekly_trend(expenses, window.trend_weeks, reference),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }

    /// Percentage change between the last two weeks, if the earlier one had spending
    pub fn week_over_week_change(&self) -> Option<f64> {
        change_between(self.weekly_trend.iter().map(|w| w.amount))
    }

    /// Percentage change between the last two months, if the earlier one had spending
    pub fn month_over_month_change(&self) -> Option<f64> {
        change_between(self.monthly_trend.iter().map(|m| m.amount))
    }
}

fn change_between(series: impl DoubleEndedIterator<Item = Money>) -> Option<f64> {
    let mut rev = series.rev();
    let recent = rev.next()?;
    let previous = rev.next()?;
    if previous.is_zero() {
        return None;
    }
    Some((recent - previous).percent_of(previous))
}

/// How a report's text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Text came from the generation backend
    Generated,
    /// Text came from the fixed template set
    Templated,
    /// There was nothing to analyze
    Empty,
    /// The backend failed or timed out
    Unavailable,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Generated => "generated",
            ReportStatus::Templated => "templated",
            ReportStatus::Empty => "empty",
            ReportStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Analysis shown on the insights view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub status: ReportStatus,
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    /// Deterministic breakdown, present in every state
    pub spending_by_category: Vec<CategoryTotal>,
    pub trends: Vec<WeeklyTotal>,
}

/// Sections parsed from a generated response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAnalysis {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ParsedAnalysis {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.insights.is_empty() && self.recommendations.is_empty()
    }
}
