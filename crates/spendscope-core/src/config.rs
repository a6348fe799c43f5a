//! Configuration
//!
//! Two-layer resolution:
//! 1. An override file: `$SPENDSCOPE_CONFIG`, else
//!    `~/.config/spendscope/config.toml` when it exists
//! 2. The embedded defaults (compiled into the binary)
//!
//! Override files may be partial; missing keys keep their default values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::aggregate::{DashboardOptions, MAX_TREND_MONTHS, MAX_TREND_WEEKS};
use crate::ai::AIClient;
use crate::error::{Error, Result};
use crate::insights::InsightWindow;
use crate::registry::{builtin_categories, CategorySpec};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable naming an override file
pub const CONFIG_ENV: &str = "SPENDSCOPE_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct InsightsConfig {
    /// Backend name understood by [`AIClient::from_name`]
    pub backend: String,
    pub timeout: Duration,
    pub window: InsightWindow,
    /// Template selection seed; random when `None`
    pub seed: Option<u64>,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            backend: "none".to_string(),
            timeout: crate::insights::service::DEFAULT_TIMEOUT,
            window: InsightWindow::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub dashboard: DashboardOptions,
    pub insights: InsightsConfig,
    /// Global default categories
    pub categories: Vec<CategorySpec>,
    /// Override file the config was read from, if any
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dashboard: DashboardOptions::default(),
            insights: InsightsConfig::default(),
            categories: builtin_categories(),
            source: None,
        }
    }
}

impl Config {
    /// Resolve the override location and load
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);
        Self::load_from(path.as_deref())
    }

    /// Load from an explicit override path (embedded defaults when `None`)
    ///
    /// A path named through `SPENDSCOPE_CONFIG` or `--config` must exist; the
    /// per-user location is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return embedded_defaults();
        };
        if !path.exists() {
            if Some(path) == default_config_path().as_deref() {
                return embedded_defaults();
            }
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), "Loading config override");
        let content = fs::read_to_string(path)?;
        let mut config = parse_config(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Generation backend to use
    ///
    /// `AI_BACKEND` in the environment takes precedence over the file.
    pub fn ai_client(&self) -> Option<AIClient> {
        let client = match std::env::var("AI_BACKEND") {
            Ok(name) => AIClient::from_name(&name),
            Err(_) => AIClient::from_name(&self.insights.backend),
        };
        client.map(|c| c.with_timeout(self.insights.timeout))
    }
}

/// Per-user override location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spendscope").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    dashboard: Option<RawDashboard>,
    insights: Option<RawInsights>,
    categories: Option<Vec<CategorySpec>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDashboard {
    trend_months: Option<usize>,
    recent_limit: Option<usize>,
    top_categories: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInsights {
    backend: Option<String>,
    timeout_secs: Option<u64>,
    trend_weeks: Option<usize>,
    seed: Option<u64>,
}

/// Parse an override on top of the embedded defaults
fn parse_config(content: &str) -> Result<Config> {
    let mut config = embedded_defaults()?;
    apply_layer(&mut config, content)?;
    Ok(config)
}

fn embedded_defaults() -> Result<Config> {
    let mut config = Config::default();
    apply_layer(&mut config, DEFAULT_CONFIG)?;
    Ok(config)
}

/// Apply the keys present in one TOML document
fn apply_layer(config: &mut Config, content: &str) -> Result<()> {
    let raw: RawConfig = toml::from_str(content)?;

    if let Some(dashboard) = raw.dashboard {
        if let Some(months) = dashboard.trend_months {
            if !(1..=MAX_TREND_MONTHS).contains(&months) {
                return Err(Error::Config(format!(
                    "dashboard.trend_months must be between 1 and {}",
                    MAX_TREND_MONTHS
                )));
            }
            config.dashboard.trend_months = months;
            config.insights.window.trend_months = months;
        }
        if let Some(limit) = dashboard.recent_limit {
            config.dashboard.recent_limit = limit;
        }
        if let Some(top) = dashboard.top_categories {
            config.dashboard.top_categories = top;
        }
    }

    if let Some(insights) = raw.insights {
        if let Some(backend) = insights.backend {
            config.insights.backend = backend;
        }
        if let Some(secs) = insights.timeout_secs {
            if secs == 0 {
                return Err(Error::Config("insights.timeout_secs must be at least 1".into()));
            }
            config.insights.timeout = Duration::from_secs(secs);
        }
        if let Some(weeks) = insights.trend_weeks {
            if weeks > MAX_TREND_WEEKS {
                return Err(Error::Config(format!(
                    "insights.trend_weeks must be at most {}",
                    MAX_TREND_WEEKS
                )));
            }
            config.insights.window.trend_weeks = weeks;
        }
        if let Some(seed) = insights.seed {
            config.insights.seed = Some(seed);
        }
    }

    if let Some(categories) = raw.categories {
        for spec in &categories {
            if spec.name.trim().is_empty() {
                return Err(Error::Config("Category names cannot be empty".into()));
            }
        }
        config.categories = categories;
    }

    Ok(())
}
