//! Shared session setup and argument parsing
//!
//! Every command runs against a [`Session`]: the loaded config, an
//! in-memory store (from a snapshot or the built-in sample data), and the
//! user the command acts as.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use spendscope_core::store::SAMPLE_USER;
use spendscope_core::{
    CategoryRegistry, Config, Expense, ExpenseStore, MemoryStore, TimePeriod, UserProfile,
};
use tracing::debug;

pub struct Session {
    pub store: MemoryStore,
    pub config: Config,
    pub user: UserProfile,
    /// Print JSON instead of formatted text
    pub json: bool,
}

impl Session {
    /// Session over an existing store
    pub fn new(store: MemoryStore, config: Config, user_email: &str, json: bool) -> Result<Self> {
        let user = store
            .find_user_by_email(user_email)
            .ok_or_else(|| anyhow!("User not found: {}", user_email))?;
        Ok(Self {
            store,
            config,
            user,
            json,
        })
    }

    /// My expenses, or the household's when `partner` is set
    pub async fn expenses(&self, partner: bool) -> Result<Vec<Expense>> {
        self.store
            .expenses_for(self.user.id, partner)
            .await
            .context("Failed to load expenses")
    }

    /// Categories visible to me (and my partner's when `partner` is set)
    pub fn registry(&self, partner: bool) -> Result<CategoryRegistry> {
        self.store
            .household_registry(self.user.id, partner)
            .context("Failed to load categories")
    }

    pub fn partner(&self) -> Result<Option<UserProfile>> {
        Ok(self.store.partner_of(self.user.id)?)
    }
}

/// Load config and data, and resolve the acting user
pub fn open_session(
    data: Option<&Path>,
    user: Option<&str>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<Session> {
    let config = match config_path {
        Some(path) => Config::load_from(Some(path)),
        None => Config::load(),
    }
    .context("Failed to load config")?;

    let store = match data {
        Some(path) => MemoryStore::load(path, &config.categories)
            .with_context(|| format!("Failed to load data from {}", path.display()))?,
        None => {
            debug!("No --data given, using built-in sample data");
            MemoryStore::with_sample_data(Local::now().date_naive(), &config.categories)
                .context("Failed to build sample data")?
        }
    };

    let email = match (user, data) {
        (Some(email), _) => email.to_string(),
        (None, None) => SAMPLE_USER.to_string(),
        // A snapshot without --user: act as its only (or first) user
        (None, Some(_)) => store
            .list_users()
            .first()
            .map(|u| u.email.clone())
            .ok_or_else(|| anyhow!("Snapshot contains no users"))?,
    };

    Session::new(store, config, &email, json)
}

pub fn parse_period(period: &str) -> Result<TimePeriod> {
    period.parse().map_err(|e: String| anyhow!(e))
}

/// Parse a `--date` argument (today when absent)
pub fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(d) => Ok(d),
            Err(_) => bail!("Invalid date '{}'. Use YYYY-MM-DD", s),
        },
        None => Ok(Local::now().date_naive()),
    }
}
