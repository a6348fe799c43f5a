//! Insight service - produces the report shown on the insights view
//!
//! With a backend configured, text is generated from a prompt built out of
//! the aggregates; without one, a template is selected. Backend failures and
//! timeouts never reach the caller: the report degrades to `Unavailable`.

use std::sync::Mutex;
use std::time::Duration;

use crate::ai::InsightBackend;
use crate::error::Error;
use crate::registry::CategoryRegistry;

use super::prompt::{build_analysis_prompt, build_categorize_prompt, parse_analysis_response};
use super::selector::{select_insight, SeededStrategy, SelectionStrategy};
use super::types::{InsightInput, InsightReport, ReportStatus};

pub const EMPTY_SUMMARY: &str = "No expenses found for the selected timeframe.";
pub const EMPTY_RECOMMENDATION: &str = "Start tracking your expenses to get personalized insights.";
pub const UNAVAILABLE_SUMMARY: &str = "No insights available right now.";
const TEMPLATE_RECOMMENDATION: &str =
    "Consider reviewing your largest expense categories for potential savings.";

/// Default limit on a single generation call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct InsightService<B> {
    backend: Option<B>,
    timeout: Duration,
    strategy: Mutex<Box<dyn SelectionStrategy>>,
}

impl<B: InsightBackend> InsightService<B> {
    /// Service that generates through `backend` (or templates when `None`)
    pub fn new(backend: Option<B>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            strategy: Mutex::new(Box::new(SeededStrategy::from_entropy())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: impl SelectionStrategy + 'static) -> Self {
        self.strategy = Mutex::new(Box::new(strategy));
        self
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Build the report for one aggregated input
    pub async fn analyze(&self, input: &InsightInput) -> InsightReport {
        if input.is_empty() {
            return InsightReport {
                status: ReportStatus::Empty,
                summary: EMPTY_SUMMARY.to_string(),
                insights: Vec::new(),
                recommendations: vec![EMPTY_RECOMMENDATION.to_string()],
                spending_by_category: Vec::new(),
                trends: input.weekly_trend.clone(),
            };
        }

        match self.backend {
            Some(ref backend) => self.generate(backend, input).await,
            None => self.templated(input),
        }
    }

    async fn generate(&self, backend: &B, input: &InsightInput) -> InsightReport {
        let prompt = build_analysis_prompt(input);
        let outcome = tokio::time::timeout(self.timeout, backend.generate(&prompt))
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_secs()))
            .and_then(|r| r);

        match outcome {
            Ok(text) => {
                let parsed = parse_analysis_response(&text);
                if parsed.is_empty() {
                    tracing::warn!(model = backend.model(), "Generated analysis had no recognizable sections");
                    return unavailable(input);
                }
                tracing::debug!(
                    model = backend.model(),
                    insights = parsed.insights.len(),
                    recommendations = parsed.recommendations.len(),
                    "Generated analysis"
                );
                InsightReport {
                    status: ReportStatus::Generated,
                    summary: parsed.summary,
                    insights: parsed.insights,
                    recommendations: parsed.recommendations,
                    spending_by_category: input.categories.clone(),
                    trends: input.weekly_trend.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    model = backend.model(),
                    host = backend.host(),
                    error = %e,
                    "Insight generation failed, returning degraded report"
                );
                unavailable(input)
            }
        }
    }

    fn templated(&self, input: &InsightInput) -> InsightReport {
        let insight = {
            let mut strategy = self
                .strategy
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            select_insight(input, &mut **strategy)
        };

        InsightReport {
            status: ReportStatus::Templated,
            summary: format!(
                "Analyzed {} expenses totaling {}.",
                input.transaction_count, input.total
            ),
            insights: insight.into_iter().map(|i| i.message).collect(),
            recommendations: vec![TEMPLATE_RECOMMENDATION.to_string()],
            spending_by_category: input.categories.clone(),
            trends: input.weekly_trend.clone(),
        }
    }
}

fn unavailable(input: &InsightInput) -> InsightReport {
    InsightReport {
        status: ReportStatus::Unavailable,
        summary: UNAVAILABLE_SUMMARY.to_string(),
        insights: Vec::new(),
        recommendations: Vec::new(),
        spending_by_category: input.categories.clone(),
        trends: input.weekly_trend.clone(),
    }
}

/// Ask the backend for a category; anything outside the registry is `None`
///
/// A backend that has not answered within `timeout` counts as a failure.
pub async fn categorize_expense<B: InsightBackend + ?Sized>(
    backend: &B,
    registry: &CategoryRegistry,
    description: &str,
    merchant: Option<&str>,
    timeout: Duration,
) -> Option<String> {
    let prompt = build_categorize_prompt(description, merchant, registry.names());
    let outcome = tokio::time::timeout(timeout, backend.generate(&prompt))
        .await
        .map_err(|_| Error::Timeout(timeout.as_secs()))
        .and_then(|r| r);

    match outcome {
        Ok(answer) => {
            let answer = answer.trim().trim_matches(|c: char| c == '"' || c == '.').trim();
            let category = registry.get(answer).map(|c| c.name.clone());
            if category.is_none() {
                tracing::debug!(answer = %answer, "Suggested category not in registry");
            }
            category
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auto-categorization failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::insights::selector::FixedStrategy;
    use crate::insights::types::{Audience, InsightWindow};
    use crate::models::TimePeriod;
    use crate::registry::builtin_categories;
    use crate::test_utils::expense_on;
    use chrono::NaiveDate;

    fn registry() -> CategoryRegistry {
        CategoryRegistry::from_specs(&builtin_categories())
    }

    fn input_with(expenses: &[crate::models::Expense]) -> InsightInput {
        InsightInput::from_expenses(
            expenses,
            &registry(),
            TimePeriod::Month,
            NaiveDate::from_ymd_opt(2025, 2, 12).unwrap(),
            Audience::Individual,
            InsightWindow::default(),
        )
    }

    fn sample_input() -> InsightInput {
        let date = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        input_with(&[
            expense_on(date, 4200, Some("Groceries")),
            expense_on(date, 800, Some("Travel")),
        ])
    }

    #[tokio::test]
    async fn test_generated_report() {
        let service = InsightService::new(Some(MockBackend::new()));
        let report = service.analyze(&sample_input()).await;
        assert_eq!(report.status, ReportStatus::Generated);
        assert!(!report.summary.is_empty());
        assert_eq!(report.insights.len(), 2);
        assert_eq!(report.spending_by_category.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_backend_degrades() {
        let service = InsightService::new(Some(MockBackend::failing()));
        let report = service.analyze(&sample_input()).await;
        assert_eq!(report.status, ReportStatus::Unavailable);
        assert_eq!(report.summary, UNAVAILABLE_SUMMARY);
        assert!(report.insights.is_empty());
        assert!(report.recommendations.is_empty());
        // Deterministic aggregates survive the failure
        assert_eq!(report.spending_by_category[0].name, "Groceries");
        assert_eq!(report.trends.len(), 12);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let service = InsightService::new(Some(MockBackend::slow(Duration::from_secs(5))))
            .with_timeout(Duration::from_millis(20));
        let report = service.analyze(&sample_input()).await;
        assert_eq!(report.status, ReportStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades() {
        let service = InsightService::new(Some(MockBackend::with_response("Sure! Here you go.")));
        let report = service.analyze(&sample_input()).await;
        assert_eq!(report.status, ReportStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_empty_input_skips_backend() {
        let backend = MockBackend::new();
        let service = InsightService::new(Some(backend.clone()));
        let report = service.analyze(&input_with(&[])).await;
        assert_eq!(report.status, ReportStatus::Empty);
        assert_eq!(report.summary, EMPTY_SUMMARY);
        assert_eq!(report.recommendations, vec![EMPTY_RECOMMENDATION.to_string()]);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_templated_report_without_backend() {
        let service = InsightService::<MockBackend>::new(None).with_strategy(FixedStrategy(0));
        let report = service.analyze(&sample_input()).await;
        assert_eq!(report.status, ReportStatus::Templated);
        assert_eq!(report.summary, "Analyzed 2 expenses totaling $50.00.");
        assert_eq!(
            report.insights,
            vec!["Groceries is your biggest category this month at $42.00 (84.0% of spending)."]
        );
    }

    #[tokio::test]
    async fn test_categorize_expense_validates_answer() {
        let registry = registry();
        let good = MockBackend::with_response(" Travel\n");
        assert_eq!(
            categorize_expense(&good, &registry, "Flight to Denver", Some("United"), DEFAULT_TIMEOUT).await,
            Some("Travel".to_string())
        );

        let unknown = MockBackend::with_response("Yachts");
        assert_eq!(
            categorize_expense(&unknown, &registry, "Boat", None, DEFAULT_TIMEOUT).await,
            None
        );

        let failing = MockBackend::failing();
        assert_eq!(
            categorize_expense(&failing, &registry, "Boat", None, DEFAULT_TIMEOUT).await,
            None
        );
    }

    #[tokio::test]
    async fn test_categorize_expense_gives_up_on_slow_backend() {
        let slow = MockBackend::with_response("Travel").with_delay(Duration::from_secs(3600));
        let category = tokio::time::timeout(
            Duration::from_secs(5),
            categorize_expense(&slow, &registry(), "Flight", None, Duration::from_millis(20)),
        )
        .await
        .expect("categorization should not wait for the backend");
        assert_eq!(category, None);
        assert_eq!(slow.calls(), 1);
    }
}
