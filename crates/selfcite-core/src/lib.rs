//! Selfcite Core - Common infrastructure for the self-citation pipelines
//!
//! This crate provides the pieces every pipeline shares: logging that
//! cooperates with progress bars, a blocking HTTP helper over a shared
//! async client, retry/backoff, and the graceful-shutdown flag.

pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use http::{HttpConfig, HttpError, SHARED_RUNTIME, get_text, http_config, set_http_config};
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num, fmt_rate};
pub use retry::{backoff_duration, retry_with_backoff};
pub use shutdown::{install_signal_handlers, is_shutdown_requested, request_shutdown};
