//! Domain models for spendscope

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Default color for user-created categories
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Largest amount accepted from floating point input (in currency units)
const MAX_DOLLARS: f64 = 90_000_000_000_000.0;

/// A monetary amount stored as whole cents
///
/// JSON encodes it as a decimal number of currency units (`12.5` = $12.50),
/// which is what the dashboard clients send and expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a float amount, rounding to the nearest cent
    pub fn from_dollars(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::Validation(format!("Amount is not a number: {}", value)));
        }
        if value.abs() > MAX_DOLLARS {
            return Err(Error::Validation(format!("Amount out of range: {}", value)));
        }
        Ok(Self((value * 100.0).round() as i64))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Divide by a count, rounding half away from zero.
    /// Returns zero when `divisor` is zero.
    pub fn div_round(self, divisor: i64) -> Money {
        if divisor == 0 {
            return Money::ZERO;
        }
        let (num, den) = if divisor < 0 {
            (-self.0, -divisor)
        } else {
            (self.0, divisor)
        };
        let half = den / 2;
        if num >= 0 {
            Money((num + half) / den)
        } else {
            Money(-((-num + half) / den))
        }
    }

    /// Share of `whole` as a percentage (0 when `whole` is zero)
    pub fn percent_of(self, whole: Money) -> f64 {
        if whole.is_zero() {
            0.0
        } else {
            self.0 as f64 / whole.0 as f64 * 100.0
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_dollars(value).map_err(serde::de::Error::custom)
    }
}

/// Expense source - how it was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ExpenseSource {
    /// Entered by the user
    #[default]
    #[serde(rename = "manual")]
    Manual,
    /// Extracted from a labelled Gmail message
    #[serde(rename = "gmail-import", alias = "gmail")]
    GmailImport,
}

impl ExpenseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::GmailImport => "gmail-import",
        }
    }
}

impl FromStr for ExpenseSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "gmail-import" | "gmail" => Ok(Self::GmailImport),
            _ => Err(format!("Unknown expense source: {}", s)),
        }
    }
}

impl fmt::Display for ExpenseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    /// The user who created (and owns) this expense
    pub user_id: Uuid,
    pub amount: Money,
    pub description: String,
    /// Category name; `None` = uncategorized
    pub category: Option<String>,
    pub merchant: Option<String>,
    /// Day the expense was incurred
    pub date: NaiveDate,
    pub source: ExpenseSource,
    /// Gmail message id for imported expenses (used for de-duplication)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new expense to be stored (before validation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Money,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    /// Defaults to today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub source: ExpenseSource,
    #[serde(default)]
    pub email_id: Option<String>,
}

impl NewExpense {
    /// A manual expense with the required fields
    pub fn new(amount: Money, description: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            amount,
            description: description.into(),
            category: None,
            merchant: None,
            date: Some(date),
            source: ExpenseSource::Manual,
            email_id: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Boundary validation: non-negative amount, non-empty description
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_description(&self.description)
    }
}

/// Partial update of an expense
///
/// An empty `category` string clears the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(ref description) = self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

fn validate_amount(amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(Error::Validation(format!(
            "Amount must not be negative: {}",
            amount
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(Error::Validation("Description is required".into()));
    }
    Ok(())
}

/// A spending category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    /// `None` = global default (read-only)
    pub owner: Option<Uuid>,
}

impl Category {
    pub fn is_default(&self) -> bool {
        self.owner.is_none()
    }
}

/// Request to create a user category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default = "default_category_color")]
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_category_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

/// Partial update of a user category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A user account profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Linked partner for the shared dashboard
    pub partner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a partner invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An invitation to link partner accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerInvite {
    pub id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

/// Pending invites for a user, both directions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteList {
    pub sent: Vec<PartnerInvite>,
    pub received: Vec<PartnerInvite>,
}

/// Partner linking status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerStatus {
    pub has_partner: bool,
    pub partner: Option<UserProfile>,
}

/// Calendar-aligned time window selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(format!(
                "Unknown period: {}. Available: week, month, quarter, year",
                s
            )),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub amount: Money,
    /// Number of expenses counted
    pub count: usize,
    /// Share of the flat total (0-100)
    pub percentage: f64,
}

/// Total for one calendar month of a trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    /// Short month name (`Jan`)
    pub label: String,
    pub amount: Money,
}

/// Total for one ISO week of a trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTotal {
    /// Monday of the week
    pub week_start: NaiveDate,
    pub amount: Money,
}

/// Everything a dashboard view shows for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub period: TimePeriod,
    pub reference_date: NaiveDate,
    /// Sum over every expense supplied
    pub total_spent: Money,
    /// Sum over the expenses inside the window
    pub total_this_period: Money,
    pub average_daily: Money,
    pub average_transaction: Money,
    pub transaction_count: usize,
    pub top_categories: Vec<CategoryTotal>,
    pub monthly_trend: Vec<MonthlyTotal>,
    pub recent_expenses: Vec<Expense>,
}
