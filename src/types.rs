//! Canonical analysis data model.
//!
//! Everything the dashboard consumes is derived from a single
//! [`AnalysisResult`] per repository. Results are immutable once produced;
//! the derived fields (`authors`, `commit_count_by_date`) can only be
//! populated through [`AnalysisResult::from_parts`], which keeps them
//! consistent with `commits` no matter which source produced the data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Placeholder language key used when a repository has commits but the
/// upstream language map came back empty.
pub const UNKNOWN_LANGUAGE: &str = "Other";

/// A single commit, normalized from whichever source produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Short commit hash (first 7 hex characters).
    pub hash: String,
    /// Display name or login of the commit author.
    pub author: String,
    /// Author timestamp, UTC.
    pub date: DateTime<Utc>,
    /// First line of the commit message.
    pub message: String,
}

/// Accumulated change count for one file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path.
    pub filename: String,
    /// Total changed lines across the sampled commit window.
    pub changes: u64,
}

/// The normalized analysis bundle for one repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Identifier the result was produced for; doubles as the cache key.
    pub repository_id: String,
    /// Commits in reverse chronological order.
    pub commits: Vec<Commit>,
    /// Per-file change counts, unique by filename, sorted descending by
    /// `changes` (ties keep first-seen order).
    pub files_changed: Vec<FileChange>,
    /// Language name to weight. The unit is source-defined (bytes for the
    /// GitHub API) but internally consistent within one result.
    pub languages: HashMap<String, u64>,
    /// Distinct commit authors in first-seen order. Derived from `commits`.
    pub authors: Vec<String>,
    /// Commits per UTC day. Derived from `commits`; counts sum to
    /// `commits.len()`.
    pub commit_count_by_date: BTreeMap<NaiveDate, u32>,
}

impl AnalysisResult {
    /// Build a result from its independent parts, deriving the dependent
    /// fields.
    ///
    /// This is the only constructor: `authors` is the distinct set of
    /// commit authors, `commit_count_by_date` buckets commits by UTC day,
    /// `files_changed` is stable-sorted descending by change count, and a
    /// repository with commits always carries at least one language entry.
    pub fn from_parts(
        repository_id: impl Into<String>,
        commits: Vec<Commit>,
        mut files_changed: Vec<FileChange>,
        mut languages: HashMap<String, u64>,
    ) -> Self {
        let mut authors: Vec<String> = Vec::new();
        let mut commit_count_by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();

        for commit in &commits {
            if !authors.iter().any(|a| a == &commit.author) {
                authors.push(commit.author.clone());
            }
            *commit_count_by_date
                .entry(commit.date.date_naive())
                .or_insert(0) += 1;
        }

        // Stable sort: equal change counts keep their insertion order.
        files_changed.sort_by(|a, b| b.changes.cmp(&a.changes));

        if languages.is_empty() && !commits.is_empty() {
            languages.insert(UNKNOWN_LANGUAGE.to_string(), 1);
        }

        Self {
            repository_id: repository_id.into(),
            commits,
            files_changed,
            languages,
            authors,
            commit_count_by_date,
        }
    }

    /// Total number of commits in the analyzed window.
    pub fn total_commits(&self) -> usize {
        self.commits.len()
    }

    /// The `limit` most-changed files, in canonical order.
    pub fn top_files(&self, limit: usize) -> Vec<FileChange> {
        self.files_changed.iter().take(limit).cloned().collect()
    }
}

/// Where a returned result actually came from. Attached to everything the
/// orchestrator hands out so the UI can label synthetic or stale data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataOrigin {
    /// Fresh data from the remote hosting API.
    Primary,
    /// Synthetic data from the fallback generator.
    Fallback,
    /// Replayed from the persistent cache.
    Cached {
        /// When the cached result was originally fetched.
        fetched_at: DateTime<Utc>,
    },
}

/// The single persisted cache slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub repository_id: String,
    pub result: AnalysisResult,
    /// Provenance of `result` at the time it was cached.
    pub origin: DataOrigin,
    pub fetched_at: DateTime<Utc>,
}

/// Condensed dashboard summary for the current repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub total_commits: usize,
    /// At most five entries, canonical top-files order.
    pub top_files: Vec<FileChange>,
    pub languages: HashMap<String, u64>,
    pub authors: Vec<String>,
    pub commit_count_by_date: BTreeMap<NaiveDate, u32>,
}

/// One point of the commit activity series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: NaiveDate,
    pub commits: u32,
}

/// Inclusive date window used to narrow commit queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Whether `date` falls inside the window. Both bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Coarse time window selector driving the date-filtered views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeRange {
    /// Last 7 days, including today.
    Week,
    /// Last calendar month by day arithmetic.
    Month,
    /// Unrestricted.
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::All => "all",
        }
    }

    /// Parse a recognized time-range label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "week" => Some(TimeRange::Week),
            "month" => Some(TimeRange::Month),
            "all" => Some(TimeRange::All),
            _ => None,
        }
    }

    /// Concrete date window ending at `today`, or `None` for `All`.
    pub fn date_range(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            TimeRange::Week => Some(DateRange {
                start: today - chrono::Duration::days(6),
                end: today,
            }),
            TimeRange::Month => Some(DateRange {
                start: today
                    .checked_sub_months(chrono::Months::new(1))
                    .unwrap_or(today),
                end: today,
            }),
            TimeRange::All => None,
        }
    }
}
