pub mod api;
pub mod config;
pub mod crawl;
pub mod dump;
pub mod error;
pub mod llm;
pub mod prompt;

use std::sync::Arc;

use config::Config;
use crawl::CrawlClient;
use dump::CrawlDump;
use error::{AppError, Result};
use llm::ExtractionClient;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub crawler: CrawlClient,
    pub extractor: ExtractionClient,
    pub crawl_dump: Option<CrawlDump>,
}

impl AppState {
    /// Builds both service clients over one connection pool.
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(AppState {
            crawler: CrawlClient::new(http.clone(), config.crawl.clone()),
            extractor: ExtractionClient::new(http, config.llm.clone()),
            crawl_dump: config.crawl_dump_path.clone().map(CrawlDump::new),
            config: Arc::new(config),
        })
    }
}
