//! Synthetic fallback data generator.
//!
//! Last-resort data source used when the primary API is unreachable or
//! rejects the request. Output is a pure function of the repository
//! identifier and the current UTC day, so the dashboard stays stable (and
//! demonstrable) across reloads while offline. Callers are responsible for
//! labeling the provenance; nothing here pretends to be real history.

use crate::types::{AnalysisResult, Commit, FileChange};
use chrono::{NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Days of history the generator fabricates, ending today.
const HISTORY_DAYS: i64 = 14;

const AUTHOR_ROSTER: [&str; 4] = ["Alex Rivera", "Sam Chen", "Jordan Blake", "Priya Patel"];

const MESSAGE_TEMPLATES: [&str; 8] = [
    "Fix edge case in date handling",
    "Refactor data loading layer",
    "Add loading states to dashboard",
    "Update dependencies",
    "Improve error messages",
    "Tidy up component structure",
    "Cache analysis results locally",
    "Polish chart tooltips",
];

/// (path template, whether to substitute the repository name)
const PATH_TEMPLATES: [(&str, bool); 8] = [
    ("src/components/{}.tsx", true),
    ("src/App.tsx", false),
    ("README.md", false),
    ("package.json", false),
    ("src/pages/{}/index.tsx", true),
    ("src/styles/main.css", false),
    ("src/lib/{}.ts", true),
    ("src/index.tsx", false),
];

/// Deterministic plausible-data generator.
#[derive(Default)]
pub struct SyntheticGenerator;

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a full analysis result anchored to today's UTC date.
    ///
    /// Never fails; two calls with the same identifier on the same day
    /// produce identical output.
    pub fn generate(&self, repository_id: &str) -> AnalysisResult {
        self.generate_on(repository_id, Utc::now().date_naive())
    }

    /// Clock-injected variant of [`generate`](Self::generate).
    pub fn generate_on(&self, repository_id: &str, today: NaiveDate) -> AnalysisResult {
        let seed = repository_id
            .chars()
            .fold(0u64, |acc, c| acc.wrapping_add(c as u64));
        let mut rng = StdRng::seed_from_u64(seed);

        let mut commits = Vec::new();
        let mut sequence = 0usize;
        for day_offset in 0..HISTORY_DAYS {
            let date = today - chrono::Duration::days(day_offset);
            let count: u32 = rng.gen_range(1..=12);
            for slot in 0..count {
                // Newest first: later slots sit earlier in the day.
                let hour = 21 - slot.min(11);
                let minute: u32 = rng.gen_range(0..60);
                let timestamp = Utc.from_utc_datetime(
                    &date
                        .and_hms_opt(hour, minute, 0)
                        .expect("valid synthetic timestamp"),
                );
                commits.push(Commit {
                    hash: format!("{:07x}", rng.r#gen::<u32>() & 0x0FFF_FFFF),
                    author: AUTHOR_ROSTER[(seed as usize + sequence) % AUTHOR_ROSTER.len()]
                        .to_string(),
                    date: timestamp,
                    message: MESSAGE_TEMPLATES[sequence % MESSAGE_TEMPLATES.len()].to_string(),
                });
                sequence += 1;
            }
        }

        let languages = self.languages(&mut rng);
        let files = self.files(repository_id, &mut rng);

        AnalysisResult::from_parts(repository_id, commits, files, languages)
    }

    fn languages(&self, rng: &mut StdRng) -> HashMap<String, u64> {
        // Base web-stack distribution, perturbed by the seed-driven RNG.
        [
            ("TypeScript", 38u64),
            ("JavaScript", 27),
            ("CSS", 18),
            ("HTML", 9),
        ]
        .into_iter()
        .map(|(name, base)| {
            let jitter = rng.gen_range(0..8);
            (name.to_string(), (base + jitter).max(1))
        })
        .collect()
    }

    fn files(&self, repository_id: &str, rng: &mut StdRng) -> Vec<FileChange> {
        let stem = repo_stem(repository_id);
        PATH_TEMPLATES
            .into_iter()
            .map(|(template, substitute)| {
                let filename = if substitute {
                    template.replace("{}", &stem)
                } else {
                    template.to_string()
                };
                FileChange {
                    filename,
                    changes: rng.gen_range(3..=60),
                }
            })
            .collect()
    }
}

/// A filesystem-friendly stem derived from the identifier's last path
/// segment.
fn repo_stem(repository_id: &str) -> String {
    let tail = repository_id
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repo")
        .trim_end_matches(".git");
    let stem: String = tail
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() { "repo".to_string() } else { stem }
}
