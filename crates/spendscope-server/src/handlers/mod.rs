//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analysis;
pub mod categories;
pub mod expenses;
pub mod gmail;
pub mod health;
pub mod partners;
pub mod users;

// Re-export all handlers for use in router
pub use analysis::*;
pub use categories::*;
pub use expenses::*;
pub use gmail::*;
pub use health::*;
pub use partners::*;
pub use users::*;

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use spendscope_core::TimePeriod;

use crate::AppError;

/// The acting user, passed as `?user_id=`
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

/// Parse a `timeframe` parameter (month when absent)
pub(crate) fn parse_timeframe(timeframe: Option<&str>) -> Result<TimePeriod, AppError> {
    match timeframe {
        Some(s) => s.parse().map_err(|e: String| AppError::bad_request(&e)),
        None => Ok(TimePeriod::Month),
    }
}

/// Reference date for windowed queries (today when absent)
pub(crate) fn reference_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
