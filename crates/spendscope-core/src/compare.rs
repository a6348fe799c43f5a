//! Two-party spending comparison

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{filter_by_period, total_spent};
use crate::models::{Expense, Money, TimePeriod};
use crate::registry::CategoryRegistry;

/// One side's total and its share of the combined total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub total: Money,
    /// 0-100, full precision
    pub percentage: f64,
}

impl Share {
    /// Percentage rounded to one decimal place for display
    pub fn rounded_percentage(&self) -> f64 {
        (self.percentage * 10.0).round() / 10.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combined {
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub mine: Share,
    pub partner: Share,
    pub combined: Combined,
}

/// Comparison of one category between partners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryComparison {
    pub name: String,
    pub color: String,
    #[serde(flatten)]
    pub comparison: Comparison,
}

/// Windowed comparison of two users' spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerComparison {
    pub period: TimePeriod,
    pub reference_date: NaiveDate,
    pub totals: Comparison,
    pub categories: Vec<CategoryComparison>,
}

/// `part` as a percentage of `whole`; zero when `whole` is zero
pub fn share(part: Money, whole: Money) -> f64 {
    part.percent_of(whole)
}

/// Split a pair of totals into shares of their sum
pub fn compare(mine: Money, partner: Money) -> Comparison {
    let combined = mine + partner;
    Comparison {
        mine: Share {
            total: mine,
            percentage: share(mine, combined),
        },
        partner: Share {
            total: partner,
            percentage: share(partner, combined),
        },
        combined: Combined { total: combined },
    }
}

/// Per-category comparison, largest combined spend first
pub fn compare_categories(
    mine: &[&Expense],
    partner: &[&Expense],
    registry: &CategoryRegistry,
) -> Vec<CategoryComparison> {
    let mut sums: BTreeMap<&str, (Money, Money)> = BTreeMap::new();
    for expense in mine {
        let name = registry.resolve(expense.category.as_deref()).name.as_str();
        sums.entry(name).or_default().0 += expense.amount;
    }
    for expense in partner {
        let name = registry.resolve(expense.category.as_deref()).name.as_str();
        sums.entry(name).or_default().1 += expense.amount;
    }

    let mut rows: Vec<CategoryComparison> = sums
        .into_iter()
        .filter(|(_, (a, b))| !(*a + *b).is_zero())
        .filter_map(|(name, (a, b))| {
            registry.get(name).map(|category| CategoryComparison {
                name: category.name.clone(),
                color: category.color.clone(),
                comparison: compare(a, b),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.comparison
            .combined
            .total
            .cmp(&a.comparison.combined.total)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

/// Compare both users over the `period` window containing `reference`
pub fn compare_expenses(
    mine: &[Expense],
    partner: &[Expense],
    registry: &CategoryRegistry,
    period: TimePeriod,
    reference: NaiveDate,
) -> PartnerComparison {
    let mine = filter_by_period(mine, period, reference);
    let partner = filter_by_period(partner, period, reference);

    PartnerComparison {
        period,
        reference_date: reference,
        totals: compare(
            total_spent(mine.iter().copied()),
            total_spent(partner.iter().copied()),
        ),
        categories: compare_categories(&mine, &partner, registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtin_categories;
    use crate::test_utils::expense_on;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compare_shares() {
        let result = compare(Money::from_cents(3000), Money::from_cents(7000));
        assert_eq!(result.mine.percentage, 30.0);
        assert_eq!(result.partner.percentage, 70.0);
        assert_eq!(result.combined.total, Money::from_cents(10000));
    }

    #[test]
    fn test_compare_zero_totals() {
        let result = compare(Money::ZERO, Money::ZERO);
        assert_eq!(result.mine.percentage, 0.0);
        assert_eq!(result.partner.percentage, 0.0);
        assert!(!result.mine.percentage.is_nan());
    }

    #[test]
    fn test_rounded_percentage() {
        let result = compare(Money::from_cents(1), Money::from_cents(2));
        assert_eq!(result.mine.rounded_percentage(), 33.3);
        assert_eq!(result.partner.rounded_percentage(), 66.7);
    }

    #[test]
    fn test_compare_expenses_by_category() {
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        let reference = date(2025, 2, 15);
        let mine = vec![
            expense_on(date(2025, 2, 1), 3000, Some("Groceries")),
            expense_on(date(2025, 1, 1), 9999, Some("Groceries")),
        ];
        let partner = vec![
            expense_on(date(2025, 2, 2), 1000, Some("Groceries")),
            expense_on(date(2025, 2, 3), 6000, Some("Travel")),
        ];

        let result = compare_expenses(&mine, &partner, &registry, TimePeriod::Month, reference);
        assert_eq!(result.totals.mine.percentage, 30.0);
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[0].name, "Travel");
        assert_eq!(result.categories[0].comparison.mine.total, Money::ZERO);
        assert_eq!(result.categories[1].comparison.mine.percentage, 75.0);
    }
}
