//! Wire types for the GitHub REST API.
//!
//! Only the fields the adapter actually reads are modeled; everything else
//! in the responses is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Deserialize)]
pub struct Repo {
    pub full_name: String,
}

/// One entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Deserialize)]
pub struct RepoCommit {
    pub sha: String,
    pub commit: CommitDetail,
    /// Top-level author is the GitHub account; absent for commits whose
    /// author has no account mapping.
    pub author: Option<Account>,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub author: GitSignature,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GitSignature {
    #[serde(default)]
    pub name: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    pub login: String,
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`, the slice with per-file
/// stats.
#[derive(Debug, Deserialize)]
pub struct CommitWithFiles {
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

#[derive(Debug, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    #[serde(default)]
    pub changes: Option<u64>,
}
