use crate::error::{DashboardError, Result};
use crate::models::{PriceRecord, RawPriceRow};
use chrono::{DateTime, NaiveDate};

// ── Parsers ───────────────────────────────────────────────────────────────────

fn is_blank(s: &str) -> bool {
    s.is_empty() || s == "N/A" || s == "-" || s == "—"
}

/// Parse price: strip a leading currency symbol and thousands separators,
/// then parse the rest as a plain float.
/// "$1,234.56" → 1234.56 | "610.00" → 610.0 | "12abc34" → None
pub fn parse_price(s: &str) -> Option<f64> {
    let s = s.trim();
    if is_blank(s) {
        return None;
    }
    let s = s.strip_prefix('$').unwrap_or(s);
    s.replace(',', "")
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
}

/// Parse share volume. Accepts "12345", "12,345" and float renderings such
/// as "12345.0" or "1.2345e4" as long as they are whole and non-negative.
pub fn parse_volume(s: &str) -> Option<u64> {
    let s = s.trim().replace(',', "");
    if is_blank(&s) {
        return None;
    }
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let v: f64 = s.parse().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

/// Parse dates: ISO date, ISO datetime with UTC offset, RFC 3339, US slashes or "Mar 04, 2025".
/// Timestamps keep their local calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%b %d, %Y") {
        return Some(d);
    }

    None
}

// ── Raw row → PriceRecord ─────────────────────────────────────────────────────

fn required<'a>(field: &'static str, value: &'a Option<String>, line: usize) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| DashboardError::Schema(format!("line {}: missing {}", line, field)))
}

fn coerce<T>(
    field: &'static str,
    value: &Option<String>,
    line: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    let raw = required(field, value, line)?;
    parse(raw).ok_or_else(|| {
        DashboardError::Schema(format!("line {}: {} {:?} is not a valid value", line, field, raw))
    })
}

fn non_negative(field: &'static str, v: f64, line: usize) -> Result<f64> {
    if v < 0.0 {
        return Err(DashboardError::Schema(format!(
            "line {}: {} must be non-negative, got {}",
            line, field, v
        )));
    }
    Ok(v)
}

/// Coerce one CSV row. `line` is the 1-based line number in the file.
pub fn csv_row_to_record(row: &RawPriceRow, line: usize) -> Result<PriceRecord> {
    let price = |field: &'static str, value: &Option<String>| -> Result<f64> {
        let v = coerce(field, value, line, parse_price)?;
        non_negative(field, v, line)
    };

    Ok(PriceRecord {
        date: coerce("date", &row.date, line, parse_date)?,
        open: price("open", &row.open)?,
        high: price("high", &row.high)?,
        low: price("low", &row.low)?,
        close: price("close", &row.close)?,
        adj_close: price("adj_close", &row.adj_close)?,
        volume: coerce("volume", &row.volume, line, parse_volume)?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
