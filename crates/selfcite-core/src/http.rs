//! Blocking HTTP GET over a shared async client.
//!
//! Uses async reqwest on a small shared tokio runtime, but presents a sync
//! interface: the pipelines are strictly sequential and API-latency bound.

use std::sync::{LazyLock, Mutex, OnceLock};
use std::time::{Duration, Instant};

use crate::retry::retry_with_backoff;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime-tunable HTTP behaviour (config file defaults, CLI overrides).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Retries for 429/5xx/transport errors; 0 means fail fast and let the caller skip
    pub max_retries: u32,
    /// Minimum spacing between consecutive requests (API quota)
    pub min_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 0,
            min_interval: Duration::from_millis(120),
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install the global HTTP config. Must run before the first request.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::warn!("HTTP config already initialized, ignoring override");
    }
}

/// Current HTTP config (defaults if never set).
pub fn http_config() -> &'static HttpConfig {
    HTTP_CONFIG.get_or_init(HttpConfig::default)
}

/// Error types for HTTP operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Server answered with a non-success status
    Status { status: u16, message: String },
    /// Connection, TLS, timeout or body read failure
    Transport(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport(message) => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped so API keys passed as query parameters never reach logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        let message = e.without_url().to_string();
        match status {
            Some(status) => Self::Status { status, message },
            None => Self::Transport(message),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 429 | 500..=599),
            Self::Transport(_) => true,
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<Result<reqwest::Client, String>> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(http_config().timeout)
        .pool_max_idle_per_host(2)
        .build()
        .map_err(|e| e.to_string())
});

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<Result<tokio::runtime::Runtime, String>> =
    LazyLock::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|e| e.to_string())
    });

/// Instant of the previous request, for throttling.
static LAST_REQUEST: Mutex<Option<Instant>> = Mutex::new(None);

/// Sleep until `min_interval` has passed since the previous request.
fn throttle(min_interval: Duration) {
    let mut last = LAST_REQUEST.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(prev) = *last {
        let elapsed = prev.elapsed();
        if elapsed < min_interval {
            std::thread::sleep(min_interval - elapsed);
        }
    }
    *last = Some(Instant::now());
}

/// HTTP GET returning the body as text.
///
/// Throttled per [`HttpConfig::min_interval`]; retryable failures are retried
/// up to [`HttpConfig::max_retries`] times with exponential backoff.
pub fn get_text(url: &str, headers: &[(&str, &str)]) -> Result<String, HttpError> {
    let client = SHARED_CLIENT
        .as_ref()
        .map_err(|e| HttpError::Transport(format!("client init: {e}")))?;
    let runtime = SHARED_RUNTIME
        .as_ref()
        .map_err(|e| HttpError::Transport(format!("runtime init: {e}")))?;
    let config = http_config();

    retry_with_backoff(url_label(url), config.max_retries, || {
        throttle(config.min_interval);
        runtime.block_on(async {
            let mut request = client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            let response = request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(HttpError::from_reqwest)?;
            response.text().await.map_err(HttpError::from_reqwest)
        })
    })
}

/// Path part of a URL for log lines (no scheme/host/query).
fn url_label(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or(without_scheme, |i| &without_scheme[i..]);
    path.split('?').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_err(status: u16) -> HttpError {
        HttpError::Status {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn not_found_detected() {
        assert!(status_err(404).is_not_found());
        assert!(!status_err(500).is_not_found());
        assert!(!HttpError::Transport("reset".into()).is_not_found());
    }

    #[test]
    fn rate_limit_and_server_errors_retryable() {
        assert!(status_err(429).is_retryable());
        assert!(status_err(500).is_retryable());
        assert!(status_err(503).is_retryable());
    }

    #[test]
    fn client_errors_not_retryable() {
        assert!(!status_err(400).is_retryable());
        assert!(!status_err(401).is_retryable());
        assert!(!status_err(404).is_retryable());
    }

    #[test]
    fn transport_errors_retryable() {
        assert!(HttpError::Transport("connection refused".into()).is_retryable());
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", status_err(404)), "HTTP 404: test");
        assert_eq!(
            format!("{}", HttpError::Transport("timeout".into())),
            "HTTP error: timeout"
        );
    }

    #[test]
    fn url_label_strips_host_and_query() {
        assert_eq!(
            url_label("https://api.elsevier.com/content/abstract/eid/2-s2.0-1?view=FULL"),
            "/content/abstract/eid/2-s2.0-1"
        );
        assert_eq!(url_label("no-scheme"), "no-scheme");
    }

    #[test]
    fn default_config_fails_fast() {
        let config = HttpConfig::default();
        assert_eq!(config.max_retries, 0);
        assert!(config.min_interval > Duration::ZERO);
    }
}
