//! Prompt construction and response parsing for generated analyses

use super::types::{InsightInput, ParsedAnalysis};

/// Build the analysis prompt from aggregated facts
pub fn build_analysis_prompt(input: &InsightInput) -> String {
    let category_breakdown = input
        .categories
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.amount))
        .collect::<Vec<_>>()
        .join("\n");

    let trend_line = input
        .week_over_week_change()
        .map(|change| format!("- Weekly spending change: {:+.1}%\n", change))
        .unwrap_or_default();

    format!(
        "Analyze the following expense data for {audience} over the past {period}.

EXPENSE SUMMARY:
- Total expenses: {count}
- Total spent: {total}
- Average per day: {daily}
- Average per transaction: {per_tx}
{trend_line}
SPENDING BY CATEGORY:
{category_breakdown}

Please provide:
1. A brief 2-3 sentence summary of the spending patterns
2. 3-4 specific insights about the spending habits (be specific with numbers)
3. 3-4 actionable recommendations to improve financial health

Format your response as:
SUMMARY: [your summary]

INSIGHTS:
- [insight 1]
- [insight 2]
- [insight 3]

RECOMMENDATIONS:
- [recommendation 1]
- [recommendation 2]
- [recommendation 3]

Keep the tone helpful and constructive, not judgmental.",
        audience = input.audience.describe(),
        period = input.period,
        count = input.transaction_count,
        total = input.total,
        daily = input.average_daily,
        per_tx = input.average_transaction,
    )
}

/// Build the prompt asking for a single category name
pub fn build_categorize_prompt<'a>(
    description: &str,
    merchant: Option<&str>,
    categories: impl IntoIterator<Item = &'a str>,
) -> String {
    let choices = categories
        .into_iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Given this expense:
Description: {}
Merchant: {}

What category does this belong to? Choose from:
{}

Respond with just the category name, nothing else.",
        description,
        merchant.unwrap_or("Unknown"),
        choices
    )
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Insights,
    Recommendations,
}

/// Parse the `SUMMARY:` / `INSIGHTS:` / `RECOMMENDATIONS:` response format
///
/// Headings are matched case-insensitively; bullets may use `-`, `*` or `•`.
/// Lines outside any section are ignored.
pub fn parse_analysis_response(text: &str) -> ParsedAnalysis {
    let mut result = ParsedAnalysis::default();
    let mut section: Option<Section> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let upper = line.to_uppercase();
        if let Some(rest) = strip_heading(line, &upper, "SUMMARY:") {
            section = Some(Section::Summary);
            if !rest.is_empty() {
                result.summary = rest.to_string();
            }
            continue;
        }
        if strip_heading(line, &upper, "INSIGHTS:").is_some() {
            section = Some(Section::Insights);
            continue;
        }
        if strip_heading(line, &upper, "RECOMMENDATIONS:").is_some() {
            section = Some(Section::Recommendations);
            continue;
        }

        let bullet = ["- ", "* ", "• "]
            .iter()
            .find_map(|marker| line.strip_prefix(marker))
            .map(str::trim);

        match (section, bullet) {
            (Some(Section::Insights), Some(item)) => result.insights.push(item.to_string()),
            (Some(Section::Recommendations), Some(item)) => {
                result.recommendations.push(item.to_string())
            }
            (Some(Section::Summary), _) if result.summary.is_empty() => {
                result.summary = line.to_string()
            }
            _ => {}
        }
    }

    result
}

fn strip_heading<'a>(line: &'a str, upper: &str, heading: &str) -> Option<&'a str> {
    let stripped = upper.trim_start_matches(['*', '#', ' ']);
    if !stripped.starts_with(heading) {
        return None;
    }
    let offset = upper.len() - stripped.len() + heading.len();
    line.get(offset..).map(|rest| rest.trim().trim_start_matches('*').trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::types::{Audience, InsightWindow};
    use crate::models::TimePeriod;
    use crate::registry::{builtin_categories, CategoryRegistry};
    use crate::test_utils::expense_on;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_well_formed_response() {
        let text = "SUMMARY: You spent mostly on food.

INSIGHTS:
- Food is 60% of spending
- Travel doubled

RECOMMENDATIONS:
- Cook at home twice a week
* Set a travel budget";
        let parsed = parse_analysis_response(text);
        assert_eq!(parsed.summary, "You spent mostly on food.");
        assert_eq!(parsed.insights, vec!["Food is 60% of spending", "Travel doubled"]);
        assert_eq!(parsed.recommendations.len(), 2);
        assert_eq!(parsed.recommendations[1], "Set a travel budget");
    }

    #[test]
    fn test_parse_summary_on_next_line_and_markdown_headings() {
        let text = "**Summary:**
Spending is steady.
## INSIGHTS:
- One";
        let parsed = parse_analysis_response(text);
        assert_eq!(parsed.summary, "Spending is steady.");
        assert_eq!(parsed.insights, vec!["One"]);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_analysis_response("I cannot help with that.").is_empty());
        assert!(parse_analysis_response("").is_empty());
    }

    #[test]
    fn test_analysis_prompt_lists_facts() {
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        let date = |d| NaiveDate::from_ymd_opt(2025, 2, d).unwrap();
        let expenses = vec![
            expense_on(date(3), 2500, Some("Groceries")),
            expense_on(date(11), 1250, None),
        ];
        let input = InsightInput::from_expenses(
            &expenses,
            &registry,
            TimePeriod::Month,
            date(12),
            Audience::Household,
            InsightWindow::default(),
        );
        let prompt = build_analysis_prompt(&input);
        assert!(prompt.contains("a household (two partners) over the past month"));
        assert!(prompt.contains("- Total expenses: 2"));
        assert!(prompt.contains("- Total spent: $37.50"));
        assert!(prompt.contains("- Groceries: $25.00"));
        assert!(prompt.contains("- Other: $12.50"));
        assert!(prompt.contains("Weekly spending change: -50.0%"));
    }

    #[test]
    fn test_categorize_prompt() {
        let prompt = build_categorize_prompt("Uber ride", None, ["Travel", "Other"]);
        assert!(prompt.contains("Merchant: Unknown"));
        assert!(prompt.contains("- Travel\n- Other"));
    }
}
