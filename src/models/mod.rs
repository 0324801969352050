use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

// ── Price record ──────────────────────────────────────────────────────────────

/// One trading day from the input CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

// ── Derived record ────────────────────────────────────────────────────────────

/// A price record extended with the three proxy metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub price: PriceRecord,
    pub market_cap: f64,
    pub revenue: f64,
    pub earnings: f64,
}

// ── Raw CSV row ───────────────────────────────────────────────────────────────

/// Header-mapped CSV cells before type coercion.
#[derive(Debug, Clone, Default)]
pub struct RawPriceRow {
    pub date: Option<String>,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub adj_close: Option<String>,
    pub volume: Option<String>,
}

// ── Columns ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
    MarketCap,
    Revenue,
    Earnings,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::AdjClose => "adj_close",
            Column::Volume => "volume",
            Column::MarketCap => "market_cap",
            Column::Revenue => "revenue",
            Column::Earnings => "earnings",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Column {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Column::Open),
            "high" => Ok(Column::High),
            "low" => Ok(Column::Low),
            "close" => Ok(Column::Close),
            "adj_close" | "adj close" => Ok(Column::AdjClose),
            "volume" => Ok(Column::Volume),
            "market_cap" => Ok(Column::MarketCap),
            "revenue" => Ok(Column::Revenue),
            "earnings" => Ok(Column::Earnings),
            other => Err(DashboardError::Schema(format!("unknown column {:?}", other))),
        }
    }
}

/// A dated row whose numeric columns can be looked up by name.
pub trait Row {
    fn date(&self) -> NaiveDate;

    /// `None` when the row type does not carry `column`.
    fn value(&self, column: Column) -> Option<f64>;
}

impl Row for PriceRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Open => Some(self.open),
            Column::High => Some(self.high),
            Column::Low => Some(self.low),
            Column::Close => Some(self.close),
            Column::AdjClose => Some(self.adj_close),
            Column::Volume => Some(self.volume as f64),
            Column::MarketCap | Column::Revenue | Column::Earnings => None,
        }
    }
}

impl Row for DerivedRecord {
    fn date(&self) -> NaiveDate {
        self.price.date
    }

    fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::MarketCap => Some(self.market_cap),
            Column::Revenue => Some(self.revenue),
            Column::Earnings => Some(self.earnings),
            price_col => self.price.value(price_col),
        }
    }
}

// ── Annotation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationStyle {
    pub show_arrow: bool,
    pub arrow_head: u8,
    pub font_size: u8,
    pub font_color: String,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            show_arrow: true,
            arrow_head: 2,
            font_size: 12,
            font_color: "black".to_string(),
        }
    }
}

/// Marker on the most recent point of a chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub anchor_date: NaiveDate,
    pub anchor_value: f64,
    pub label: String,  // "$728.72B", "$2.94 EPS"
    pub text: String,   // label + newline + date
    pub style: AnnotationStyle,
}
