use crate::config::DataConfig;
use crate::error::{DashboardError, Result};
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, warn};
use url::Url;

/// Outcome of a single GET attempt.
#[derive(Debug)]
enum Attempt {
    /// Worth retrying: network failure, 429, 5xx.
    Transient(String),
    /// Other 4xx, unreadable body.
    Fatal(String),
}

impl Attempt {
    fn message(self) -> String {
        match self {
            Attempt::Transient(m) | Attempt::Fatal(m) => m,
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: usize,
    retry_delay_ms: u64,
}

impl HttpClient {
    pub fn new(config: &DataConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .map_err(|e| DashboardError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            max_retries: config.max_retries as usize,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// Backoff doubles from `2 × retry_delay_ms`, capped at 30s.
    fn backoff(&self) -> std::iter::Take<ExponentialBackoff> {
        ExponentialBackoff::from_millis(2)
            .factor(self.retry_delay_ms)
            .max_delay(Duration::from_secs(30))
            .take(self.max_retries)
    }

    async fn try_get(&self, url: &Url) -> std::result::Result<String, Attempt> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Attempt::Transient(format!("request error: {}", e)))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .text()
                .await
                .map_err(|e| Attempt::Fatal(format!("failed to read response body: {}", e)));
        }

        if status.as_u16() == 429 || status.is_server_error() {
            warn!("{} returned {}, will retry", url, status);
            Err(Attempt::Transient(format!("HTTP {}", status)))
        } else {
            Err(Attempt::Fatal(format!("HTTP error {}", status)))
        }
    }

    /// Fetch a URL as text, retrying transient failures.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        RetryIf::start(
            self.backoff(),
            || self.try_get(url),
            |e: &Attempt| matches!(e, Attempt::Transient(_)),
        )
        .await
        .map_err(|e| DashboardError::Fetch(format!("{}: {}", url, e.message())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Serve `replies` in order, one per connection, repeating the last one.
    /// Returns the base URL and a counter of accepted connections.
    async fn serve(replies: Vec<String>) -> (Url, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let reply = replies[n.min(replies.len() - 1)].clone();

                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = sock.write_all(reply.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });

        let url = Url::parse(&format!("http://{}/prices.csv", addr)).unwrap();
        (url, hits)
    }

    fn client(max_retries: u32) -> HttpClient {
        let config = DataConfig {
            timeout_secs: 5,
            max_retries,
            retry_delay_ms: 1,
            ..DataConfig::default()
        };
        HttpClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_retries_server_error_then_succeeds() {
        let body = "Date,Close\n2025-03-04,259.26\n";
        let (url, hits) = serve(vec![
            response("503 Service Unavailable", "busy"),
            response("200 OK", body),
        ])
        .await;

        let text = client(3).get_text(&url).await.unwrap();
        assert_eq!(text, body);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_fails_after_one_attempt() {
        let (url, hits) = serve(vec![response("404 Not Found", "")]).await;

        let err = client(3).get_text(&url).await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(ref m) if m.contains("404")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_too_many_requests_gives_up_after_max_retries() {
        let (url, hits) = serve(vec![response("429 Too Many Requests", "")]).await;

        let err = client(2).get_text(&url).await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(ref m) if m.contains("429")));
        // first attempt plus two retries
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
