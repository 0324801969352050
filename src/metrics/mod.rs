//! Market-cap, revenue and EPS proxies derived from close price and volume.
//!
//! These are point-in-time approximations driven by a single outstanding-share
//! count, not reported financials.

use crate::error::{DashboardError, Result};
use crate::models::{DerivedRecord, PriceRecord};
use tracing::debug;

/// Share count used when no configuration overrides it.
pub const DEFAULT_OUTSTANDING_SHARES: f64 = 2.8e9;

pub fn market_cap(close: f64, outstanding_shares: f64) -> f64 {
    close * outstanding_shares
}

pub fn revenue(volume: u64, close: f64) -> f64 {
    volume as f64 * close
}

pub fn earnings(revenue: f64, outstanding_shares: f64) -> f64 {
    revenue / outstanding_shares
}

fn check_shares(outstanding_shares: f64) -> Result<()> {
    if !outstanding_shares.is_finite() || outstanding_shares <= 0.0 {
        return Err(DashboardError::Domain(format!(
            "outstanding shares must be a positive finite number, got {}",
            outstanding_shares
        )));
    }
    Ok(())
}

fn check_finite(row: &DerivedRecord) -> Result<()> {
    let metrics = [
        ("market_cap", row.market_cap),
        ("revenue", row.revenue),
        ("earnings", row.earnings),
    ];
    for (name, value) in metrics {
        if !value.is_finite() {
            return Err(DashboardError::Domain(format!(
                "{} is not finite on {} ({})",
                name, row.price.date, value
            )));
        }
    }
    Ok(())
}

/// Append `market_cap`, `revenue` and `earnings` to every record.
/// Row count and order are preserved.
pub fn derive(records: &[PriceRecord], outstanding_shares: f64) -> Result<Vec<DerivedRecord>> {
    check_shares(outstanding_shares)?;

    let derived = records
        .iter()
        .map(|r| {
            let revenue = revenue(r.volume, r.close);
            let row = DerivedRecord {
                price: r.clone(),
                market_cap: market_cap(r.close, outstanding_shares),
                revenue,
                earnings: earnings(revenue, outstanding_shares),
            };
            check_finite(&row)?;
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Derived metrics for {} rows (outstanding shares {:e})",
        derived.len(),
        outstanding_shares
    );
    Ok(derived)
}
