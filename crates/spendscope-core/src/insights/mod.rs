//! Spending insights
//!
//! Turns aggregated facts into short statements, either from a fixed template
//! set or through a text-generation backend.

pub mod prompt;
pub mod selector;
pub mod service;
pub mod types;

pub use selector::{
    eligible_insights, select_insight, FixedStrategy, Insight, InsightTemplate, SeededStrategy,
    SelectionStrategy,
};
pub use service::{categorize_expense, InsightService};
pub use types::{Audience, InsightInput, InsightReport, InsightWindow, ParsedAnalysis, ReportStatus};
