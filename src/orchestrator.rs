//! Repository analysis orchestrator.
//!
//! The façade the UI talks to. `analyze` sequences cache lookup, one
//! primary attempt, unconditional fallback, and the cache write; the read
//! accessors re-query the primary source for narrow slices and degrade to
//! the cached full result when that fails.
//!
//! Each `analyze` call is issued a monotonically increasing request token;
//! only the response matching the newest token may update the session
//! context and the cache, so a stale in-flight analysis finishing after the
//! user switched repositories cannot clobber the current one.

use crate::cache::ResultCache;
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::fallback::SyntheticGenerator;
use crate::github::{GithubSource, parse_repository_id};
use crate::source::AnalysisSource;
use crate::storage::{KeyValueStore, MemoryStore};
use crate::transport::{
    AlwaysOnline, HttpDispatch, NetworkProbe, Payload, ReqwestDispatch, RequestSpec, Transport,
};
use crate::types::{
    ActivityPoint, AnalysisResult, Commit, DataOrigin, DateRange, FileChange, RepoSummary,
    TimeRange,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An analysis result plus its provenance, as handed to the UI.
#[derive(Clone, Debug)]
pub struct Analyzed {
    pub result: AnalysisResult,
    pub origin: DataOrigin,
}

struct SessionState {
    token: u64,
    repository_id: String,
    result: AnalysisResult,
    origin: DataOrigin,
}

/// Orchestrates cache, primary source, and fallback into an always-available
/// data set.
pub struct RepoAnalyzer {
    source: Arc<dyn AnalysisSource>,
    generator: SyntheticGenerator,
    cache: ResultCache,
    transport: Arc<Transport>,
    config: AnalyticsConfig,
    session: Mutex<Option<SessionState>>,
    issued: AtomicU64,
    clock: fn() -> DateTime<Utc>,
}

impl RepoAnalyzer {
    pub fn builder() -> RepoAnalyzerBuilder {
        RepoAnalyzerBuilder::new()
    }

    /// Analyze a repository, returning data no matter how the primary source
    /// behaves.
    ///
    /// A valid cache entry for the same identifier short-circuits the
    /// network entirely. Otherwise the primary source gets exactly one
    /// attempt; any failure switches to the synthetic generator, which
    /// cannot fail. Reachability problems therefore never surface here;
    /// the only error is an invalid identifier, raised before any I/O.
    pub async fn analyze(&self, repository_id: &str) -> AnalyticsResult<Analyzed> {
        parse_repository_id(repository_id)?;

        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(entry) = self.cache.read()
            && entry.repository_id == repository_id
            && self
                .cache
                .is_valid_at(self.config.cache_max_age, (self.clock)())
        {
            let origin = DataOrigin::Cached {
                fetched_at: entry.fetched_at,
            };
            self.commit_session(token, repository_id, entry.result.clone(), origin.clone(), false);
            return Ok(Analyzed {
                result: entry.result,
                origin,
            });
        }

        match self.source.fetch_analysis(repository_id).await {
            Ok(result) => {
                self.commit_session(
                    token,
                    repository_id,
                    result.clone(),
                    DataOrigin::Primary,
                    true,
                );
                Ok(Analyzed {
                    result,
                    origin: DataOrigin::Primary,
                })
            }
            Err(err) => {
                log::warn!(
                    "primary source failed for {repository_id} ({err}); serving synthetic data"
                );
                let result = self
                    .generator
                    .generate_on(repository_id, (self.clock)().date_naive());
                self.commit_session(
                    token,
                    repository_id,
                    result.clone(),
                    DataOrigin::Fallback,
                    true,
                );
                Ok(Analyzed {
                    result,
                    origin: DataOrigin::Fallback,
                })
            }
        }
    }

    /// Commit a finished analysis as the current session, unless a newer
    /// request has been issued in the meantime.
    fn commit_session(
        &self,
        token: u64,
        repository_id: &str,
        result: AnalysisResult,
        origin: DataOrigin,
        write_cache: bool,
    ) {
        if self.issued.load(Ordering::SeqCst) != token {
            log::info!("discarding stale analysis for {repository_id}");
            return;
        }
        {
            let mut session = self.session.lock().expect("session lock");
            if session.as_ref().is_some_and(|s| s.token > token) {
                return;
            }
            *session = Some(SessionState {
                token,
                repository_id: repository_id.to_string(),
                result: result.clone(),
                origin: origin.clone(),
            });
        }
        if write_cache {
            self.cache.write(repository_id, &result, origin);
        }
    }

    /// Provenance of the data the accessors are currently serving, for UI
    /// labeling.
    pub fn current_origin(&self) -> Option<DataOrigin> {
        if let Some(state) = self.session.lock().expect("session lock").as_ref() {
            return Some(state.origin.clone());
        }
        self.cache.read().map(|entry| DataOrigin::Cached {
            fetched_at: entry.fetched_at,
        })
    }

    /// Current-repository snapshot: the live session if one exists, else the
    /// persisted cache entry. Cloned out so callers never observe a
    /// half-written context.
    fn snapshot(&self) -> Option<(String, AnalysisResult)> {
        if let Some(state) = self.session.lock().expect("session lock").as_ref() {
            return Some((state.repository_id.clone(), state.result.clone()));
        }
        self.cache
            .read()
            .map(|entry| (entry.repository_id, entry.result))
    }

    /// Resilient read shared by the narrow accessors: try a fresh primary
    /// fetch for the current repository, degrade to deriving from the
    /// snapshot, and fail only when no data exists at all.
    async fn read_with_fallback<T, F, Fut, D>(&self, fetch: F, derive: D) -> AnalyticsResult<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = AnalyticsResult<T>>,
        D: FnOnce(&AnalysisResult) -> T,
    {
        let (repository_id, result) = self.snapshot().ok_or(AnalyticsError::NoDataAvailable)?;
        match fetch(repository_id).await {
            Ok(fresh) => Ok(fresh),
            Err(err) => {
                log::warn!("narrow fetch failed ({err}); deriving from cached result");
                Ok(derive(&result))
            }
        }
    }

    /// Commits for the current repository, narrowed by time window and
    /// author.
    pub async fn get_commits(
        &self,
        range: TimeRange,
        author: Option<&str>,
    ) -> AnalyticsResult<Vec<Commit>> {
        let window = range.date_range((self.clock)().date_naive());
        let source = Arc::clone(&self.source);
        let author_owned = author.map(str::to_string);
        self.read_with_fallback(
            move |id| async move {
                source
                    .fetch_commits(&id, window, author_owned.as_deref())
                    .await
            },
            |result| filter_commits(&result.commits, window, author),
        )
        .await
    }

    /// Language-weight map for the current repository.
    pub async fn get_languages(&self) -> AnalyticsResult<HashMap<String, u64>> {
        let source = Arc::clone(&self.source);
        self.read_with_fallback(
            move |id| async move { source.fetch_languages(&id).await },
            |result| result.languages.clone(),
        )
        .await
    }

    /// The `limit` most-changed files of the current repository.
    ///
    /// Change counts come from the sampled commit window of the underlying
    /// analysis, not full history.
    pub fn get_top_files(&self, limit: usize) -> AnalyticsResult<Vec<FileChange>> {
        let (_, result) = self.snapshot().ok_or(AnalyticsError::NoDataAvailable)?;
        Ok(result.top_files(limit))
    }

    /// Daily commit counts restricted to `range`, ascending by date.
    pub fn get_activity_series(&self, range: TimeRange) -> AnalyticsResult<Vec<ActivityPoint>> {
        let (_, result) = self.snapshot().ok_or(AnalyticsError::NoDataAvailable)?;
        let window = range.date_range((self.clock)().date_naive());
        Ok(result
            .commit_count_by_date
            .iter()
            .filter(|(date, _)| window.is_none_or(|w| w.contains(**date)))
            .map(|(date, commits)| ActivityPoint {
                date: *date,
                commits: *commits,
            })
            .collect())
    }

    /// Condensed summary of the current repository.
    pub fn get_repo_summary(&self) -> AnalyticsResult<RepoSummary> {
        let (_, result) = self.snapshot().ok_or(AnalyticsError::NoDataAvailable)?;
        Ok(RepoSummary {
            total_commits: result.total_commits(),
            top_files: result.top_files(5),
            languages: result.languages.clone(),
            authors: result.authors.clone(),
            commit_count_by_date: result.commit_count_by_date.clone(),
        })
    }

    /// Render the current analysis into a report artifact via the configured
    /// export endpoint.
    pub async fn export_report(
        &self,
        repository_id: &str,
        range: TimeRange,
    ) -> AnalyticsResult<Bytes> {
        let url = self.config.export_url.clone().ok_or_else(|| {
            AnalyticsError::Config("export endpoint is not configured".to_string())
        })?;

        let summary = self
            .snapshot()
            .filter(|(id, _)| id == repository_id)
            .map(|(_, result)| result);
        let body = serde_json::json!({
            "repositoryId": repository_id,
            "timeRange": range.as_str(),
            "analysis": summary,
        });

        let payload = self
            .transport
            .send(
                &RequestSpec::post(url, body),
                self.config.max_retries,
                self.config.request_timeout,
            )
            .await?;
        match payload {
            Payload::Binary(bytes) => Ok(bytes),
            Payload::Json(_) => Err(AnalyticsError::Protocol {
                status: 200,
                message: "export endpoint returned a non-binary payload".to_string(),
            }),
        }
    }

    /// Drop the persisted cache entry.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}

fn filter_commits(
    commits: &[Commit],
    window: Option<DateRange>,
    author: Option<&str>,
) -> Vec<Commit> {
    commits
        .iter()
        .filter(|c| window.is_none_or(|w| w.contains(c.date.date_naive())))
        .filter(|c| author.is_none_or(|a| c.author == a))
        .cloned()
        .collect()
}

/// Builder assembling an analyzer from its collaborators. Every seam has a
/// production default; tests swap in mocks.
pub struct RepoAnalyzerBuilder {
    config: AnalyticsConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    source: Option<Arc<dyn AnalysisSource>>,
    dispatch: Option<Arc<dyn HttpDispatch>>,
    probe: Option<Arc<dyn NetworkProbe>>,
    clock: fn() -> DateTime<Utc>,
}

impl RepoAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::default(),
            store: None,
            source: None,
            dispatch: None,
            probe: None,
            clock: Utc::now,
        }
    }

    pub fn config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Persistent store backing the result cache. Defaults to in-memory.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Primary data source. Defaults to the GitHub adapter.
    pub fn source(mut self, source: Arc<dyn AnalysisSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn dispatch(mut self, dispatch: Arc<dyn HttpDispatch>) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn NetworkProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Replace the wall clock (tests).
    pub fn clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> RepoAnalyzer {
        let dispatch = self
            .dispatch
            .unwrap_or_else(|| Arc::new(ReqwestDispatch::new()));
        let probe = self.probe.unwrap_or_else(|| Arc::new(AlwaysOnline));
        let transport = Arc::new(
            Transport::new(dispatch, probe)
                .with_retry_base_delay(self.config.retry_base_delay),
        );
        let source = self.source.unwrap_or_else(|| {
            Arc::new(GithubSource::new(
                Arc::clone(&transport),
                self.config.clone(),
            ))
        });
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let cache = ResultCache::new(store).with_clock(self.clock);

        RepoAnalyzer {
            source,
            generator: SyntheticGenerator::new(),
            cache,
            transport,
            config: self.config,
            session: Mutex::new(None),
            issued: AtomicU64::new(0),
            clock: self.clock,
        }
    }
}

impl Default for RepoAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
