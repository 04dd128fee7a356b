//! Optional on-disk copy of the most recent crawl, for debugging prompts.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crawl::{CrawlOutcome, CrawledSite};

#[derive(Serialize)]
struct DumpRecord<'a> {
    url: &'a str,
    captured_at: DateTime<Utc>,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a CrawledSite>,
}

#[derive(Debug, Clone)]
pub struct CrawlDump {
    path: PathBuf,
}

impl CrawlDump {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CrawlDump { path: path.into() }
    }

    /// Replaces the dump file with `outcome`. Failures are logged, never returned.
    pub async fn record(&self, url: &str, outcome: &CrawlOutcome) {
        let record = match outcome {
            CrawlOutcome::Completed(site) => DumpRecord {
                url,
                captured_at: Utc::now(),
                completed: true,
                job_id: None,
                data: Some(site),
            },
            CrawlOutcome::Incomplete { job_id, .. } => DumpRecord {
                url,
                captured_at: Utc::now(),
                completed: false,
                job_id: Some(job_id),
                data: None,
            },
        };

        let bytes = match serde_json::to_vec_pretty(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize crawl dump");
                return;
            }
        };

        match tokio::fs::write(&self.path, bytes).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Wrote crawl dump"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not write crawl dump")
            }
        }
    }
}
