//! `commit-metrics` - resilient data acquisition for Git analytics dashboards.
//!
//! This library turns an unreliable, rate-limited hosting API into a
//! consistent, cached, always-available analysis data set. The orchestrator
//! ([`RepoAnalyzer`]) sequences cache lookup, a single primary fetch with
//! retries and timeouts, and a deterministic synthetic fallback, then keeps
//! the dependent dashboard views (summary, commit list, language histogram,
//! hot files, activity series) consistent with one underlying result and a
//! user-selected time window.

// Module declarations
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod github;
pub mod orchestrator;
pub mod source;
pub mod storage;
pub mod transport;
pub mod types;

// Re-export the orchestrator facade
pub use orchestrator::{Analyzed, RepoAnalyzer, RepoAnalyzerBuilder};

// Re-export error types
pub use error::{AnalyticsError, AnalyticsResult};

// Re-export configuration
pub use config::AnalyticsConfig;

// Re-export the canonical data model
pub use types::{
    ActivityPoint, AnalysisResult, CacheEntry, Commit, DataOrigin, DateRange, FileChange,
    RepoSummary, TimeRange,
};

// Re-export the collaborator seams
pub use cache::ResultCache;
pub use fallback::SyntheticGenerator;
pub use github::{GithubSource, RepoId, parse_repository_id};
pub use source::AnalysisSource;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transport::{
    AlwaysOnline, HttpDispatch, HttpResponse, NetworkProbe, Payload, ReqwestDispatch, RequestSpec,
    Transport,
};
