//! Expense storage
//!
//! [`ExpenseStore`] is the read contract the dashboards and analyses depend
//! on. [`MemoryStore`] is the in-process implementation shared by the CLI and
//! the server; it also owns users, categories and partner invites.

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{
    sample_snapshot, Snapshot, SnapshotCategory, SnapshotExpense, SnapshotUser, SAMPLE_PARTNER,
    SAMPLE_USER,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Expense;
use crate::registry::CategoryRegistry;

/// Largest page size for expense listings
pub const MAX_PAGE_SIZE: usize = 500;

/// Default page size for expense listings
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Read access to a user's expenses and categories
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// All expenses owned by `user_id` (plus the linked partner's when
    /// `include_partner`), newest date first, ties in creation order
    async fn expenses_for(&self, user_id: Uuid, include_partner: bool) -> Result<Vec<Expense>>;

    /// Categories visible to `user_id`
    async fn registry_for(&self, user_id: Uuid) -> Result<CategoryRegistry>;
}

/// Filters for an expense listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseQuery {
    #[serde(default)]
    pub include_partner: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Category name
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ExpenseQuery {
    fn default() -> Self {
        Self {
            include_partner: false,
            start_date: None,
            end_date: None,
            category: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ExpenseQuery {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(start) = self.start_date {
            if expense.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if expense.date > end {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if expense.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        true
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn page_size(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}
