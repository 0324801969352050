pub mod http_client;

use crate::config::DataConfig;
use crate::error::{DashboardError, Result};
use crate::loader::{load_csv, load_prices};
use crate::models::PriceRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use self::http_client::HttpClient;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Where the price history comes from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn describe(&self) -> String;
    async fn fetch_prices(&self) -> Result<Vec<PriceRecord>>;
}

// ── Local file ────────────────────────────────────────────────────────────────

pub struct FileSource {
    path: PathBuf,
}

#[async_trait]
impl PriceSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_prices(&self) -> Result<Vec<PriceRecord>> {
        load_csv(&self.path)
    }
}

// ── Remote CSV ────────────────────────────────────────────────────────────────

pub struct HttpSource {
    client: HttpClient,
    url: Url,
}

#[async_trait]
impl PriceSource for HttpSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_prices(&self) -> Result<Vec<PriceRecord>> {
        let body = self.client.get_text(&self.url).await?;
        let records = load_prices(body.as_bytes())?;
        info!("{}: {} rows fetched", self.url, records.len());
        Ok(records)
    }
}

// ── Bootstrap ─────────────────────────────────────────────────────────────────

enum Location {
    Path(PathBuf),
    Remote(Url),
}

fn classify(source: &str) -> Result<Location> {
    let source = source.trim();
    if source.is_empty() {
        return Err(DashboardError::Schema("data source is empty".into()));
    }

    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Location::Remote(url)),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(Location::Path)
            .map_err(|_| DashboardError::Schema(format!("invalid file URL {:?}", source))),
        // drive letters ("C:\data.csv") parse as one-letter schemes
        Ok(url) if url.scheme().len() > 1 => Err(DashboardError::Schema(format!(
            "unsupported data source scheme {:?}",
            url.scheme()
        ))),
        _ => Ok(Location::Path(PathBuf::from(source))),
    }
}

fn ensure_readable(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Resolve the configured data source. Must run before any load.
pub fn connect(config: &DataConfig) -> Result<Box<dyn PriceSource>> {
    let source: Box<dyn PriceSource> = match classify(&config.source)? {
        Location::Path(path) => {
            ensure_readable(&path)?;
            Box::new(FileSource { path })
        }
        Location::Remote(url) => Box::new(HttpSource {
            client: HttpClient::new(config)?,
            url,
        }),
    };

    info!("Connected to data source {}", source.describe());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: &str) -> DataConfig {
        DataConfig {
            source: source.to_string(),
            ..DataConfig::default()
        }
    }

    #[test]
    fn test_classify() {
        assert!(matches!(classify("data/prices.csv"), Ok(Location::Path(_))));
        assert!(matches!(classify("C:\\data\\prices.csv"), Ok(Location::Path(_))));
        assert!(matches!(
            classify("https://example.com/jpm.csv"),
            Ok(Location::Remote(u)) if u.host_str() == Some("example.com")
        ));
        assert!(matches!(classify("ftp://example.com/x.csv"), Err(DashboardError::Schema(_))));
        assert!(matches!(classify("  "), Err(DashboardError::Schema(_))));
    }

    #[test]
    fn test_connect_missing_file_fails() {
        let err = connect(&config("no/such/prices.csv")).err().unwrap();
        assert!(matches!(err, DashboardError::Io { .. }));
    }

    #[test]
    fn test_connect_and_fetch_local_file() {
        let path = std::env::temp_dir().join(format!("stock-dashboard-src-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "date,open,high,low,close,adj_close,volume\n2025-03-04,1,2,1,1.5,1.5,10\n",
        )
        .unwrap();

        let source = connect(&config(path.to_str().unwrap())).unwrap();
        let rows = tokio_test::block_on(source.fetch_prices()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].volume, 10);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_connect_url_builds_http_source() {
        let source = connect(&config("https://example.com/data/jpm.csv")).unwrap();
        assert_eq!(source.describe(), "https://example.com/data/jpm.csv");
    }
}
