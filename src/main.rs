// CommitMetrics CLI
//
// Analyzes one repository and prints the dashboard summary, labeling where
// the data actually came from (live API, synthetic fallback, or cache).

use anyhow::{Context, Result, bail};
use commit_metrics::{AnalyticsConfig, DataOrigin, FileStore, RepoAnalyzer, TimeRange};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(repository_id) = args.next() else {
        bail!("usage: commit-metrics <repository-url> [week|month|all]");
    };
    let range = match args.next().as_deref() {
        None => TimeRange::Week,
        Some(label) => TimeRange::from_label(label)
            .with_context(|| format!("unrecognized time range '{label}'"))?,
    };

    let cache_dir = dirs::cache_dir()
        .context("no cache directory available")?
        .join("commit-metrics");
    let store = FileStore::new(cache_dir)?;

    let analyzer = RepoAnalyzer::builder()
        .config(AnalyticsConfig::from_env())
        .store(Arc::new(store))
        .build();

    let analyzed = analyzer.analyze(&repository_id).await?;
    let provenance = match analyzed.origin {
        DataOrigin::Primary => "live API data".to_string(),
        DataOrigin::Fallback => "synthetic fallback data".to_string(),
        DataOrigin::Cached { fetched_at } => format!("cached data from {fetched_at}"),
    };

    let summary = analyzer.get_repo_summary()?;
    println!("{repository_id} ({provenance})");
    println!("  commits analyzed: {}", summary.total_commits);
    println!("  authors: {}", summary.authors.join(", "));

    let mut languages: Vec<_> = summary.languages.iter().collect();
    languages.sort_by(|a, b| b.1.cmp(a.1));
    println!("  languages:");
    for (name, weight) in languages {
        println!("    {name:<12} {weight}");
    }

    println!("  most modified files (sampled window):");
    for file in &summary.top_files {
        println!("    {:<40} {}", file.filename, file.changes);
    }

    println!("  activity ({}):", range.as_str());
    for point in analyzer.get_activity_series(range)? {
        println!("    {}  {}", point.date, point.commits);
    }

    Ok(())
}
