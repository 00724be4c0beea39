//! One digest run: prepare the output directory, fetch, summarize, write.

use crate::agent::Summarizer;
use crate::arxiv;
use crate::config::Config;
use crate::digest::{build_digest, Digest};
use crate::storage::{DigestStore, StorageError};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

/// What a finished run produced
#[derive(Debug)]
pub struct RunReport {
    pub path: PathBuf,
    pub digest: Digest,
}

/// Run the pipeline once for `date`.
///
/// Fetch and summarization failures degrade the digest; only local
/// filesystem errors are returned.
pub async fn run(config: &Config, date: NaiveDate) -> Result<RunReport, StorageError> {
    let store = DigestStore::open(&config.digest.output_dir)?;

    let topic = &config.digest.topic;
    let papers = arxiv::fetch_papers(&config.arxiv, topic, config.digest.max_results).await;

    let summarizer = Summarizer::from_config(config);
    let digest = build_digest(&papers, topic, date, &summarizer).await;

    let path = store.store(date, &digest.markdown)?;
    info!(papers = digest.papers, fallbacks = digest.fallbacks, path = %path.display(), "digest written");

    Ok(RunReport { path, digest })
}
