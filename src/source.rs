//! Contract between the orchestrator and a primary data source.

use crate::error::AnalyticsResult;
use crate::types::{AnalysisResult, Commit, DateRange};
use async_trait::async_trait;
use std::collections::HashMap;

/// A primary data source capable of producing full analysis results and the
/// narrower slices the dashboard views re-query.
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    /// Produce the full canonical analysis for one repository.
    async fn fetch_analysis(&self, repository_id: &str) -> AnalyticsResult<AnalysisResult>;

    /// Fetch commits narrowed by an inclusive date window and/or exact
    /// author.
    async fn fetch_commits(
        &self,
        repository_id: &str,
        range: Option<DateRange>,
        author: Option<&str>,
    ) -> AnalyticsResult<Vec<Commit>>;

    /// Fetch the language-weight map.
    async fn fetch_languages(&self, repository_id: &str)
    -> AnalyticsResult<HashMap<String, u64>>;
}
