//! Seeding a store: built-in sample data and JSON snapshots
//!
//! Snapshots refer to users by email so they are easy to write by hand:
//!
//! ```json
//! {
//!   "users": [{"email": "alex@example.com", "name": "Alex", "partner": "sam@example.com"}],
//!   "categories": [{"owner": "alex@example.com", "name": "Pets", "color": "#f97316"}],
//!   "expenses": [{"user": "alex@example.com", "amount": 12.5, "description": "Lunch",
//!                 "category": "Food & Dining", "date": "2025-02-03"}]
//! }
//! ```

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{ExpenseSource, Money, NewCategory, NewExpense, DEFAULT_CATEGORY_COLOR};
use crate::period::{month_start, previous_month_start};
use crate::registry::CategorySpec;

use super::MemoryStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<SnapshotUser>,
    #[serde(default)]
    pub categories: Vec<SnapshotCategory>,
    #[serde(default)]
    pub expenses: Vec<SnapshotExpense>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Email of the linked partner
    #[serde(default)]
    pub partner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCategory {
    /// Email of the owning user
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotExpense {
    /// Email of the owning user
    pub user: String,
    pub amount: Money,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub source: ExpenseSource,
    #[serde(default)]
    pub email_id: Option<String>,
}

impl MemoryStore {
    /// Build a store from a parsed snapshot
    pub fn from_snapshot(snapshot: Snapshot, defaults: &[CategorySpec]) -> Result<Self> {
        let store = Self::new(defaults);

        for user in &snapshot.users {
            store.create_user(&user.email, user.name.as_deref())?;
        }
        for user in &snapshot.users {
            if let Some(ref partner_email) = user.partner {
                store.link_by_email(&user.email, partner_email)?;
            }
        }
        for category in snapshot.categories {
            let owner = store.require_user(&category.owner)?;
            store.create_category(
                owner,
                NewCategory {
                    name: category.name,
                    color: category
                        .color
                        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
                    icon: category.icon,
                },
            )?;
        }
        for expense in snapshot.expenses {
            let owner = store.require_user(&expense.user)?;
            store.add_expense(
                owner,
                NewExpense {
                    amount: expense.amount,
                    description: expense.description,
                    category: expense.category,
                    merchant: expense.merchant,
                    date: Some(expense.date),
                    source: expense.source,
                    email_id: expense.email_id,
                },
            )?;
        }

        info!(
            users = store.list_users().len(),
            "Loaded store snapshot"
        );
        Ok(store)
    }

    pub fn from_json(json: &str, defaults: &[CategorySpec]) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, defaults)
    }

    /// Load a JSON snapshot file (read-only: the store never writes it back)
    pub fn load(path: &Path, defaults: &[CategorySpec]) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json, defaults)
    }

    fn require_user(&self, email: &str) -> Result<uuid::Uuid> {
        self.find_user_by_email(email)
            .map(|u| u.id)
            .ok_or_else(|| Error::NotFound(format!("User {}", email)))
    }

    /// Link two users directly, as if an invite had been accepted
    fn link_by_email(&self, email: &str, partner_email: &str) -> Result<()> {
        let user = self
            .find_user_by_email(email)
            .ok_or_else(|| Error::NotFound(format!("User {}", email)))?;
        let partner = self
            .find_user_by_email(partner_email)
            .ok_or_else(|| Error::NotFound(format!("User {}", partner_email)))?;
        if user.partner_id == Some(partner.id) {
            return Ok(());
        }
        let invite = self.send_invite(user.id, &partner.email)?;
        self.accept_invite(partner.id, invite.id)?;
        Ok(())
    }

    /// Two linked users with six months of everyday spending up to `reference`
    pub fn with_sample_data(reference: NaiveDate, defaults: &[CategorySpec]) -> Result<Self> {
        Self::from_snapshot(sample_snapshot(reference), defaults)
    }
}

/// Email of the primary sample user
pub const SAMPLE_USER: &str = "alex@example.com";
/// Email of the sample user's partner
pub const SAMPLE_PARTNER: &str = "sam@example.com";

// (owner, day of month, cents, description, category, merchant)
const SAMPLE_MONTH: &[(&str, u32, i64, &str, Option<&str>, &str)] = &[
    (SAMPLE_USER, 2, 8450, "Weekly groceries", Some("Groceries"), "Whole Foods"),
    (SAMPLE_USER, 5, 4500, "Gas", Some("Transportation"), "Shell"),
    (SAMPLE_USER, 8, 1599, "Netflix", Some("Subscriptions"), "Netflix"),
    (SAMPLE_USER, 12, 1825, "Lunch", Some("Food & Dining"), "Chipotle"),
    (SAMPLE_USER, 15, 9800, "Electric bill", Some("Bills & Utilities"), "City Power"),
    (SAMPLE_USER, 20, 3999, "Headphones", Some("Shopping"), "Amazon"),
    (SAMPLE_USER, 24, 2600, "Movie night", Some("Entertainment"), "AMC Theatres"),
    (SAMPLE_USER, 27, 2300, "Farmers market", None, "Farmers market"),
    (SAMPLE_PARTNER, 3, 6230, "Groceries", Some("Groceries"), "Trader Joe's"),
    (SAMPLE_PARTNER, 9, 2150, "Ride home", Some("Transportation"), "Uber"),
    (SAMPLE_PARTNER, 10, 1099, "Spotify", Some("Subscriptions"), "Spotify"),
    (SAMPLE_PARTNER, 18, 2475, "Prescription", Some("Healthcare"), "CVS Pharmacy"),
    (SAMPLE_PARTNER, 21, 650, "Coffee", Some("Food & Dining"), "Blue Bottle"),
    (SAMPLE_PARTNER, 26, 5412, "Home goods", Some("Shopping"), "Target"),
];

/// Deterministic sample snapshot covering the six months ending at `reference`
pub fn sample_snapshot(reference: NaiveDate) -> Snapshot {
    let mut expenses = Vec::new();
    let mut month = month_start(reference);

    for offset in 0..6i64 {
        for &(user, day, cents, description, category, merchant) in SAMPLE_MONTH {
            let date = month + Duration::days(i64::from(day) - 1);
            if date > reference {
                continue;
            }
            // Vary amounts month to month so trends are not flat
            let cents = cents + (offset * 137 + cents / 10) % 900 - 300;
            expenses.push(SnapshotExpense {
                user: user.to_string(),
                amount: Money::from_cents(cents.max(100)),
                description: description.to_string(),
                category: category.map(str::to_string),
                merchant: Some(merchant.to_string()),
                date,
                source: ExpenseSource::Manual,
                email_id: None,
            });
        }
        month = previous_month_start(month);
    }

    Snapshot {
        users: vec![
            SnapshotUser {
                email: SAMPLE_USER.to_string(),
                name: Some("Alex".to_string()),
                partner: Some(SAMPLE_PARTNER.to_string()),
            },
            SnapshotUser {
                email: SAMPLE_PARTNER.to_string(),
                name: Some("Sam".to_string()),
                partner: None,
            },
        ],
        categories: Vec::new(),
        expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtin_categories;
    use crate::store::ExpenseStore;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_sample_data_is_linked_and_bounded() {
        let reference = date(2025, 2, 14);
        let store = MemoryStore::with_sample_data(reference, &builtin_categories()).unwrap();
        let alex = store.find_user_by_email(SAMPLE_USER).unwrap();
        assert!(store.partner_status(alex.id).unwrap().has_partner);

        let household = store.expenses_for(alex.id, true).await.unwrap();
        assert!(!household.is_empty());
        assert!(household.iter().all(|e| e.date <= reference));
        assert!(household.iter().all(|e| e.date >= date(2024, 9, 1)));
        assert!(household.iter().any(|e| e.category.is_none()));
    }

    #[test]
    fn test_sample_snapshot_is_deterministic() {
        let a = serde_json::to_string(&sample_snapshot(date(2025, 2, 14))).unwrap();
        let b = serde_json::to_string(&sample_snapshot(date(2025, 2, 14))).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_load_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "users": [
                    {{"email": "a@example.com", "partner": "b@example.com"}},
                    {{"email": "b@example.com"}}
                ],
                "categories": [{{"owner": "a@example.com", "name": "Pets"}}],
                "expenses": [
                    {{"user": "a@example.com", "amount": 12.5, "description": "Kibble",
                      "category": "Pets", "date": "2025-02-03"}},
                    {{"user": "b@example.com", "amount": 3, "description": "Tea",
                      "date": "2025-02-04", "source": "gmail-import", "email_id": "m1"}}
                ]
            }}"#
        )
        .unwrap();

        let store = MemoryStore::load(file.path(), &builtin_categories()).unwrap();
        let a = store.find_user_by_email("a@example.com").unwrap();
        let b = store.find_user_by_email("b@example.com").unwrap();
        assert_eq!(a.partner_id, Some(b.id));

        let expenses = store.expenses_for(a.id, true).await.unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1].category.as_deref(), Some("Pets"));
        assert_eq!(expenses[1].amount, Money::from_cents(1250));
        assert!(store.imported_email_ids(b.id).contains("m1"));
    }

    #[test]
    fn test_snapshot_unknown_user_errors() {
        let json = r#"{"expenses": [{"user": "ghost@example.com", "amount": 1,
            "description": "x", "date": "2025-01-01"}]}"#;
        assert!(matches!(
            MemoryStore::from_json(json, &builtin_categories()),
            Err(Error::NotFound(_))
        ));
        assert!(MemoryStore::from_json("not json", &builtin_categories()).is_err());
    }
}
