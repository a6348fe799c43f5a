//! Test utilities for spendscope-core
//!
//! Expense builders and a seeded store for unit tests here and in the CLI and
//! server crates (enable the `test-utils` feature).

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Expense, ExpenseSource, Money};
use crate::registry::builtin_categories;
use crate::store::MemoryStore;

/// Owner used by [`expense_on`]
pub const TEST_USER_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0001);

/// A manual expense of `cents` on `date`
pub fn expense_on(date: NaiveDate, cents: i64, category: Option<&str>) -> Expense {
    expense_for(TEST_USER_ID, date, cents, category)
}

/// Like [`expense_on`] with an explicit owner
pub fn expense_for(user_id: Uuid, date: NaiveDate, cents: i64, category: Option<&str>) -> Expense {
    let now = Utc::now();
    Expense {
        id: Uuid::new_v4(),
        user_id,
        amount: Money::from_cents(cents),
        description: category.unwrap_or("Misc").to_string(),
        category: category.map(str::to_string),
        merchant: None,
        date,
        source: ExpenseSource::Manual,
        email_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Sample store (two linked users, six months of data) ending at `reference`
pub fn sample_store(reference: NaiveDate) -> MemoryStore {
    MemoryStore::with_sample_data(reference, &builtin_categories())
        .expect("sample data is valid")
}
