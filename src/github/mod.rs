//! GitHub primary data source adapter.
//!
//! Maps a repository identifier onto the GitHub REST API and normalizes the
//! responses into the canonical analysis shape.

pub mod client;
pub mod identifier;

pub(crate) mod api;

pub use client::GithubSource;
pub use identifier::{RepoId, parse_repository_id};
