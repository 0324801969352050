use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metrics::DEFAULT_OUTSTANDING_SHARES;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Data-source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Local path or http(s) URL of the price CSV.
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Metric derivation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_outstanding_shares")]
    pub outstanding_shares: f64,
}

/// Dashboard copy and layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_company")]
    pub company: String,

    /// Page title; defaults to "<company> Stock Data Visualization".
    #[serde(default)]
    pub title: Option<String>,

    /// Markdown shown before the tables.
    #[serde(default)]
    pub intro: Option<String>,

    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    #[serde(default)]
    pub market_cap_text: Option<String>,

    #[serde(default)]
    pub revenue_text: Option<String>,

    #[serde(default)]
    pub earnings_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_source() -> String {
    "data/prices.csv".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_user_agent() -> String {
    "stock-dashboard/0.1".to_string()
}
fn default_outstanding_shares() -> f64 {
    DEFAULT_OUTSTANDING_SHARES
}
fn default_company() -> String {
    "The Company".to_string()
}
fn default_preview_rows() -> usize {
    10
}
fn default_output_path() -> PathBuf {
    PathBuf::from("dashboard.html")
}
fn default_output_format() -> OutputFormat {
    OutputFormat::Html
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            outstanding_shares: default_outstanding_shares(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            company: default_company(),
            title: None,
            intro: None,
            preview_rows: default_preview_rows(),
            market_cap_text: None,
            revenue_text: None,
            earnings_text: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: default_output_format(),
        }
    }
}

impl DashboardConfig {
    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("{} Stock Data Visualization", self.company))
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("DASH").separator("__"))
            .build()
            .context("Failed to read configuration")?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[metrics]\noutstanding_shares = 1000.0\n[output]\nformat = \"json\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.metrics.outstanding_shares, 1000.0);
        assert_eq!(cfg.output.format, OutputFormat::Json);
        assert_eq!(cfg.data.source, "data/prices.csv");
        assert_eq!(cfg.dashboard.preview_rows, 10);
    }

    #[test]
    fn test_default_title_uses_company() {
        let dash = DashboardConfig {
            company: "JPMorgan Chase".into(),
            ..DashboardConfig::default()
        };
        assert_eq!(dash.title(), "JPMorgan Chase Stock Data Visualization");
    }
}
