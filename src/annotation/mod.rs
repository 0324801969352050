//! Latest-value annotations for the metric charts.

use crate::error::{DashboardError, Result};
use crate::models::{Annotation, AnnotationStyle, Column, Row};
use crate::utils::fmt_decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// `$1,234.56B`
    Billions,
    /// `$2.94 EPS`
    Eps,
}

impl FormatMode {
    pub fn label(self, value: f64) -> String {
        match self {
            FormatMode::Billions => format!("${}B", fmt_decimal(value / 1e9, 2)),
            FormatMode::Eps => format!("${:.2} EPS", value),
        }
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatMode::Billions => f.write_str("billions"),
            FormatMode::Eps => f.write_str("eps"),
        }
    }
}

impl FromStr for FormatMode {
    type Err = DashboardError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "billions" => Ok(FormatMode::Billions),
            "eps" => Ok(FormatMode::Eps),
            _ => Err(DashboardError::UnknownFormatMode(s.to_string())),
        }
    }
}

/// Fails on the first date that precedes its predecessor.
pub fn ensure_ascending<R: Row>(rows: &[R]) -> Result<()> {
    for pair in rows.windows(2) {
        let (prev, next) = (pair[0].date(), pair[1].date());
        if next < prev {
            return Err(DashboardError::Domain(format!(
                "table is not sorted by ascending date ({} followed by {})",
                prev, next
            )));
        }
    }
    Ok(())
}

/// Build the annotation for the most recent row of `rows`.
pub fn format<R: Row>(rows: &[R], column: Column, mode: FormatMode) -> Result<Annotation> {
    let latest = rows.last().ok_or_else(|| {
        DashboardError::Domain(format!("cannot annotate {}: table is empty", column))
    })?;
    let value = latest.value(column).ok_or_else(|| {
        DashboardError::Schema(format!("column {} is not present in the table", column))
    })?;
    ensure_ascending(rows)?;

    let date = latest.date();
    let label = mode.label(value);
    let text = format!("{}\n{}", label, date.format("%Y-%m-%d"));

    Ok(Annotation {
        anchor_date: date,
        anchor_value: value,
        label,
        text,
        style: AnnotationStyle::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::derive;
    use crate::models::{DerivedRecord, PriceRecord};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn price(date: NaiveDate, close: f64, volume: u64) -> PriceRecord {
        PriceRecord {
            date,
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume,
        }
    }

    fn derived(date: NaiveDate, market_cap: f64, earnings: f64) -> DerivedRecord {
        DerivedRecord {
            price: price(date, 1.0, 1),
            market_cap,
            revenue: 0.0,
            earnings,
        }
    }

    #[test]
    fn test_billions_label() {
        let rows = vec![
            derived(day(2025, 3, 3), 700_000_000_000.0, 2.5),
            derived(day(2025, 3, 4), 728_720_000_000.0, 2.94),
        ];
        let a = format(&rows, Column::MarketCap, FormatMode::Billions).unwrap();
        assert_eq!(a.label, "$728.72B");
        assert_eq!(a.text, "$728.72B\n2025-03-04");
        assert_eq!(a.anchor_date, day(2025, 3, 4));
        assert_eq!(a.anchor_value, 728_720_000_000.0);
        assert_eq!(a.style, AnnotationStyle::default());
    }

    #[test]
    fn test_billions_label_groups_thousands() {
        let rows = vec![derived(day(2025, 3, 4), 1_234_567_000_000_000.0, 0.0)];
        let a = format(&rows, Column::MarketCap, FormatMode::Billions).unwrap();
        assert_eq!(a.label, "$1,234,567.00B");
    }

    #[test]
    fn test_eps_label() {
        let rows = vec![derived(day(2025, 3, 4), 0.0, 2.94)];
        let a = format(&rows, Column::Earnings, FormatMode::Eps).unwrap();
        assert_eq!(a.label, "$2.94 EPS");
        assert_eq!(a.text, "$2.94 EPS\n2025-03-04");
    }

    #[test]
    fn test_revenue_rounds_to_zero_billions() {
        let rows: Vec<PriceRecord> = [(10.0, 100), (20.0, 200), (30.0, 300)]
            .iter()
            .enumerate()
            .map(|(i, &(c, v))| price(day(2025, 1, 1 + i as u32), c, v))
            .collect();
        let d = derive(&rows, 1000.0).unwrap();
        let a = format(&d, Column::Revenue, FormatMode::Billions).unwrap();
        assert_eq!(a.anchor_value, 9_000.0);
        assert_eq!(a.label, "$0.00B");
    }

    #[test]
    fn test_empty_table_is_domain_error() {
        let rows: Vec<DerivedRecord> = vec![];
        assert!(matches!(
            format(&rows, Column::MarketCap, FormatMode::Billions),
            Err(DashboardError::Domain(_))
        ));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let rows = vec![price(day(2025, 3, 4), 10.0, 5)];
        assert!(matches!(
            format(&rows, Column::Earnings, FormatMode::Eps),
            Err(DashboardError::Schema(_))
        ));
        // price columns annotate fine without derivation
        let a = format(&rows, Column::Close, FormatMode::Eps).unwrap();
        assert_eq!(a.label, "$10.00 EPS");
    }

    #[test]
    fn test_unsorted_table_is_rejected() {
        let rows = vec![
            derived(day(2025, 3, 4), 1.0, 1.0),
            derived(day(2025, 3, 3), 2.0, 2.0),
        ];
        assert!(matches!(
            format(&rows, Column::MarketCap, FormatMode::Billions),
            Err(DashboardError::Domain(_))
        ));
    }

    #[test]
    fn test_unknown_mode_fails_fast() {
        assert_eq!("billions".parse::<FormatMode>().unwrap(), FormatMode::Billions);
        assert_eq!("EPS".parse::<FormatMode>().unwrap(), FormatMode::Eps);
        assert!(matches!(
            "millions".parse::<FormatMode>(),
            Err(DashboardError::UnknownFormatMode(m)) if m == "millions"
        ));
    }
}
