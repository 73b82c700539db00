//! Scopus retrieval errors

use selfcite_core::HttpError;

/// Error from one Scopus retrieval.
///
/// Pipelines treat every variant as "skip this record"; the classifiers
/// only decide how loudly to log and what to count.
#[derive(Debug)]
pub enum ScopusError {
    /// 404 or an empty result for the requested identifier
    NotFound(String),
    /// Any other HTTP failure
    Http(HttpError),
    /// Response body was not the expected JSON shape
    Decode { what: String, message: String },
    /// Client cannot be used as configured (e.g. no API key)
    Config(String),
}

impl std::fmt::Display for ScopusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Http(e) => write!(f, "{e}"),
            Self::Decode { what, message } => write!(f, "invalid response for {what}: {message}"),
            Self::Config(msg) => write!(f, "configuration: {msg}"),
        }
    }
}

impl std::error::Error for ScopusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl ScopusError {
    /// Map an HTTP error, turning 404 into [`ScopusError::NotFound`].
    pub fn from_http(what: &str, e: HttpError) -> Self {
        if e.is_not_found() {
            Self::NotFound(what.to_string())
        } else {
            Self::Http(e)
        }
    }

    pub fn decode(what: &str, e: serde_json::Error) -> Self {
        Self::Decode {
            what: what.to_string(),
            message: e.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Server-side trouble (quota, 5xx) that a retry may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_retryable())
    }
}
