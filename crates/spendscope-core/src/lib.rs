//! Spendscope Core Library
//!
//! Shared functionality for the spendscope expense dashboard:
//! - Domain models and calendar period math
//! - Category registry with a fallback bucket
//! - Aggregation engine (totals, averages, breakdowns, trends)
//! - Partner comparison
//! - Insight selection and pluggable text-generation backends
//! - In-memory expense store with partner invites
//! - Gmail receipt extraction
//! - TOML configuration

pub mod aggregate;
pub mod ai;
pub mod compare;
pub mod config;
pub mod error;
pub mod import;
pub mod insights;
pub mod models;
pub mod period;
pub mod registry;
pub mod store;
pub mod view;

/// Expense builders and a seeded store for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{dashboard_stats, DashboardOptions};
pub use ai::{AIClient, InsightBackend, MockBackend, OpenAICompatibleBackend};
pub use compare::{compare, compare_expenses, Comparison, PartnerComparison};
pub use config::Config;
pub use error::{Error, Result};
pub use import::{import_messages, EmailMessage, ExpenseExtractor, GmailMessage, ImportSummary};
pub use insights::{
    categorize_expense, Audience, InsightInput, InsightReport, InsightService, ReportStatus,
};
pub use models::{
    Category, DashboardStats, Expense, ExpenseSource, Money, NewExpense, TimePeriod, UserProfile,
};
pub use period::DateWindow;
pub use registry::{builtin_categories, CategoryRegistry, CategorySpec, FALLBACK_CATEGORY};
pub use store::{ExpenseQuery, ExpenseStore, MemoryStore};
pub use view::{Ticket, ViewLoader};
