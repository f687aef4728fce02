//! Repository identifier validation.

use crate::error::{AnalyticsError, AnalyticsResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `https://github.com/<owner>/<repo>` with an optional trailing slash
    /// or `.git` suffix.
    static ref REPO_URL: Regex =
        Regex::new(r"^https://github\.com/([^/\s]+)/([^/\s]+?)(?:\.git)?/?$")
            .expect("invalid repository URL pattern");
}

/// Owner/repo pair extracted from a repository identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

/// Validate a repository identifier and split it into owner and repo.
///
/// Runs before any network call; anything that does not look like a GitHub
/// repository URL is rejected as [`AnalyticsError::InvalidRepositoryIdentifier`].
pub fn parse_repository_id(repository_id: &str) -> AnalyticsResult<RepoId> {
    let captures = REPO_URL.captures(repository_id).ok_or_else(|| {
        AnalyticsError::InvalidRepositoryIdentifier(repository_id.to_string())
    })?;
    Ok(RepoId {
        owner: captures[1].to_string(),
        repo: captures[2].to_string(),
    })
}
