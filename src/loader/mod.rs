//! CSV loader for daily price history (`date, open, high, low, close, adj_close, volume`).

pub mod cleaner;

use crate::error::{DashboardError, Result};
use crate::models::{PriceRecord, RawPriceRow};
use self::cleaner::csv_row_to_record;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const REQUIRED: [&str; 7] = ["date", "open", "high", "low", "close", "adj_close", "volume"];

/// Header positions of the required columns.
#[derive(Debug)]
struct HeaderMap {
    idx: [usize; 7],
}

impl HeaderMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let normalised: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase().replace(' ', "_"))
            .collect();

        let mut idx = [0usize; 7];
        let mut missing = Vec::new();
        for (slot, name) in idx.iter_mut().zip(REQUIRED) {
            match normalised.iter().position(|h| h == name) {
                Some(i) => *slot = i,
                None => missing.push(name),
            }
        }

        if !missing.is_empty() {
            return Err(DashboardError::Schema(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self { idx })
    }

    fn raw_row(&self, record: &csv::StringRecord) -> RawPriceRow {
        let cell = |i: usize| record.get(self.idx[i]).map(|s| s.to_string());
        RawPriceRow {
            date: cell(0),
            open: cell(1),
            high: cell(2),
            low: cell(3),
            close: cell(4),
            adj_close: cell(5),
            volume: cell(6),
        }
    }
}

/// Parse price history from any reader and return it sorted by ascending date.
pub fn load_prices<R: Read>(input: R) -> Result<Vec<PriceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = HeaderMap::from_headers(reader.headers()?)?;
    debug!("Header layout: {:?}", headers);

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        records.push(csv_row_to_record(&headers.raw_row(&record), i + 2)?);
    }

    sort_by_date(&mut records);
    Ok(records)
}

/// Load a CSV file from disk.
pub fn load_csv(path: &Path) -> Result<Vec<PriceRecord>> {
    debug!("Loading prices from {:?}", path);
    let file = std::fs::File::open(path).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = load_prices(file)?;
    info!("{:?}: {} rows loaded", path, records.len());
    Ok(records)
}

/// Stable sort by date; duplicate dates are kept in file order and reported.
pub fn sort_by_date(records: &mut [PriceRecord]) {
    if !records.windows(2).all(|w| w[0].date <= w[1].date) {
        debug!("Input is not in ascending date order, sorting");
        records.sort_by_key(|r| r.date);
    }

    let dupes = records.windows(2).filter(|w| w[0].date == w[1].date).count();
    if dupes > 0 {
        warn!("{} duplicate trading date(s) in input", dupes);
    }
}
