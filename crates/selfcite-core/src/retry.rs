//! Retry with exponential backoff for API requests

use std::time::Duration;

use crate::http::HttpError;

/// Exponential backoff: 2^attempt seconds (2s, 4s, 8s, ...)
pub const fn backoff_duration(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// Retry a fallible request with exponential backoff.
///
/// Only retryable errors (429, 5xx, transport) are retried, up to
/// `max_retries` times. With `max_retries == 0` the first error is returned
/// as is, which is what the skip-and-continue pipelines expect.
pub fn retry_with_backoff<T>(
    label: &str,
    max_retries: u32,
    mut attempt_fn: impl FnMut() -> Result<T, HttpError>,
) -> Result<T, HttpError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = backoff_duration(attempt);
                log::warn!("{label}: attempt {attempt}/{max_retries} failed: {e}, retry in {delay:?}");
                std::thread::sleep(delay);
            }
            Err(e) => {
                log::debug!("{label}: {e}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_exponential() {
        assert_eq!(backoff_duration(1), Duration::from_secs(2));
        assert_eq!(backoff_duration(2), Duration::from_secs(4));
        assert_eq!(backoff_duration(3), Duration::from_secs(8));
    }

    #[test]
    fn no_retries_returns_first_error() {
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("test", 0, || {
            calls += 1;
            Err(HttpError::Status {
                status: 503,
                message: "busy".into(),
            })
        });
        assert_eq!(calls, 1);
        assert_eq!(result.unwrap_err().status(), Some(503));
    }

    #[test]
    fn non_retryable_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("test", 3, || {
            calls += 1;
            Err(HttpError::Status {
                status: 404,
                message: "missing".into(),
            })
        });
        assert_eq!(calls, 1);
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn success_passes_through() {
        let result = retry_with_backoff("test", 2, || Ok::<_, HttpError>(7));
        assert_eq!(result.unwrap(), 7);
    }
}
