use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Job;

/// Bundled seed catalog, used when no --catalog file is given.
const SEED: &str = include_str!("../data/jobs.json");

/// Load the job catalog: a JSON array of postings from `path`, or the
/// embedded seed dataset. The catalog is read-only input; nothing here
/// writes it back.
pub fn load(path: Option<&Path>) -> Result<Vec<Job>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Catalog file is not a valid job list: {}", path.display()))
        }
        None => serde_json::from_str(SEED).context("Bundled seed catalog is malformed"),
    }
}

pub fn find_job(jobs: &[Job], id: i64) -> Option<&Job> {
    jobs.iter().find(|j| j.id == id)
}
