//! Error taxonomy for the analytics layer.
//!
//! Every component-level failure is converted to one of these kinds before
//! it reaches a caller; the UI never has to parse message strings to find
//! out what went wrong.

use thiserror::Error;

/// Error kinds surfaced by the analytics layer.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The supplied repository identifier does not name a supported
    /// hosting-provider URL. Never retried, surfaced verbatim.
    #[error("invalid repository identifier: {0}")]
    InvalidRepositoryIdentifier(String),

    /// The device is offline. Detected before any request is attempted.
    #[error("network unavailable")]
    NetworkUnavailable,

    /// A transient network failure survived every retry.
    #[error("request failed after {attempts} attempts: {message}")]
    Transient { attempts: u32, message: String },

    /// The upstream service completed the exchange but rejected the request
    /// (rate limit, auth, not-found). Not retried.
    #[error("{message}")]
    Protocol { status: u16, message: String },

    /// No primary result, no fallback run yet, and nothing cached. Only
    /// possible for read accessors invoked before any successful analyze.
    #[error("no analysis data available yet")]
    NoDataAvailable,

    /// Cache read/write failure. Swallowed at the cache boundary and logged;
    /// callers outside this crate never see it.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalyticsError {
    /// Whether this failure means the primary source was unreachable or
    /// rejected us, as opposed to caller error.
    pub fn is_reachability(&self) -> bool {
        matches!(
            self,
            AnalyticsError::NetworkUnavailable
                | AnalyticsError::Transient { .. }
                | AnalyticsError::Protocol { .. }
        )
    }
}

/// Convenience result alias for analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
