//! Client for the remote crawl-job API.
//!
//! A crawl is submitted once and, unless the service finishes it inline,
//! polled at a fixed interval until it completes or the attempt budget runs
//! out. Running out is not an error: the outcome is [`CrawlOutcome::Incomplete`]
//! and the caller carries on with an empty site.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CrawlConfig;
use crate::error::{AppError, Result};

const COMPLETED: &str = "completed";

/// Crawled pages exactly as the crawl service returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawledSite(Value);

impl CrawledSite {
    pub fn new(data: Value) -> Self {
        CrawledSite(data)
    }

    pub fn empty() -> Self {
        CrawledSite(Value::Object(serde_json::Map::new()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    Completed(CrawledSite),
    /// The job never reported completion within the poll budget.
    Incomplete { job_id: String, attempts: u32 },
}

impl CrawlOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, CrawlOutcome::Completed(_))
    }

    pub fn into_site(self) -> CrawledSite {
        match self {
            CrawlOutcome::Completed(site) => site,
            CrawlOutcome::Incomplete { .. } => CrawledSite::empty(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CrawlRequest<'a> {
    url: &'a str,
    limit: u32,
    max_depth: u32,
    scrape_options: ScrapeOptions<'a>,
}

#[derive(Serialize)]
struct ScrapeOptions<'a> {
    formats: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CrawlJob {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl CrawlJob {
    fn completed_site(&mut self) -> Option<CrawledSite> {
        if self.status.as_deref() != Some(COMPLETED) {
            return None;
        }
        Some(
            self.data
                .take()
                .map(CrawledSite::new)
                .unwrap_or_else(CrawledSite::empty),
        )
    }
}

#[derive(Debug, Clone)]
pub struct CrawlClient {
    http: Client,
    config: CrawlConfig,
}

impl CrawlClient {
    pub fn new(http: Client, config: CrawlConfig) -> Self {
        CrawlClient { http, config }
    }

    pub async fn crawl(&self, url: &str) -> Result<CrawlOutcome> {
        let mut job = self.submit(url).await?;

        if let Some(site) = job.completed_site() {
            tracing::info!(%url, "Crawl completed on submission");
            return Ok(CrawlOutcome::Completed(site));
        }

        let job_id = job.id.ok_or_else(|| {
            AppError::CrawlService(
                "crawl submission returned neither completed data nor a job id".to_string(),
            )
        })?;
        tracing::info!(%url, %job_id, "Crawl job submitted, polling for completion");

        Ok(self.poll(job_id).await)
    }

    async fn submit(&self, url: &str) -> Result<CrawlJob> {
        let body = CrawlRequest {
            url,
            limit: self.config.page_limit,
            max_depth: self.config.max_depth,
            scrape_options: ScrapeOptions {
                formats: &self.config.formats,
            },
        };

        let res = self
            .http
            .post(format!("{}/v1/crawl", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::CrawlTransport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::CrawlTransport(format!("{}: {}", status, text)));
        }

        res.json::<CrawlJob>().await.map_err(|e| {
            AppError::CrawlService(format!("invalid crawl submission response: {}", e))
        })
    }

    async fn poll(&self, job_id: String) -> CrawlOutcome {
        let attempts = self.config.poll_attempts;

        for attempt in 1..=attempts {
            match self.check_status(&job_id).await {
                Ok(mut job) => {
                    if let Some(site) = job.completed_site() {
                        tracing::info!(%job_id, attempt, "Crawl job completed");
                        return CrawlOutcome::Completed(site);
                    }
                    tracing::debug!(
                        %job_id,
                        attempt,
                        status = job.status.as_deref().unwrap_or("unknown"),
                        "Crawl job not finished"
                    );
                }
                Err(e) => {
                    tracing::warn!(%job_id, attempt, error = %e, "Crawl status check failed");
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        tracing::warn!(%job_id, attempts, "Crawl job still incomplete after poll budget");
        CrawlOutcome::Incomplete { job_id, attempts }
    }

    async fn check_status(&self, job_id: &str) -> Result<CrawlJob> {
        let res = self
            .http
            .get(format!("{}/v1/crawl/{}", self.config.base_url, job_id))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| AppError::CrawlTransport(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::CrawlService(e.to_string()))?;

        res.json::<CrawlJob>()
            .await
            .map_err(|e| AppError::CrawlService(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, poll_attempts: u32) -> CrawlClient {
        client_with_interval(server, poll_attempts, Duration::from_millis(5))
    }

    fn client_with_interval(
        server: &MockServer,
        poll_attempts: u32,
        poll_interval: Duration,
    ) -> CrawlClient {
        CrawlClient::new(
            Client::new(),
            CrawlConfig {
                api_key: "fc-test".to_string(),
                base_url: server.uri(),
                page_limit: 10,
                max_depth: 3,
                formats: CrawlConfig::default_formats(),
                poll_attempts,
                poll_interval,
            },
        )
    }

    #[tokio::test]
    async fn immediate_completion_returns_data_untouched() {
        let server = MockServer::start().await;
        let data = json!({"page1": {"markdown": "# Example", "html": "<h1>Example</h1>"}});

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .and(header("authorization", "Bearer fc-test"))
            .and(body_partial_json(json!({
                "url": "https://example.com",
                "limit": 10,
                "maxDepth": 3,
                "scrapeOptions": {"formats": ["markdown", "html", "screenshot@fullPage"]}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "completed", "data": data.clone()})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server, 7).crawl("https://example.com").await.unwrap();
        assert_eq!(outcome, CrawlOutcome::Completed(CrawledSite::new(data)));
    }

    #[tokio::test]
    async fn polls_until_job_completes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": "job-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/crawl/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "scraping"})))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/crawl/job-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "completed", "data": [{"markdown": "hi"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server, 7).crawl("https://example.com").await.unwrap();
        assert_eq!(
            outcome.into_site().as_value(),
            &json!([{"markdown": "hi"}])
        );
    }

    #[tokio::test]
    async fn exhausted_poll_budget_degrades_to_empty_site() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "scraping", "id": "job-2"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/crawl/job-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "scraping"})))
            .expect(7)
            .mount(&server)
            .await;

        let outcome = client_for(&server, 7).crawl("https://example.com").await.unwrap();
        assert_eq!(
            outcome,
            CrawlOutcome::Incomplete {
                job_id: "job-2".to_string(),
                attempts: 7
            }
        );
        assert!(!outcome.is_complete());
        assert_eq!(outcome.into_site(), CrawledSite::empty());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_poll_interval_between_status_checks() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-4"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/crawl/job-4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "scraping"})))
            .expect(3)
            .mount(&server)
            .await;

        let interval = Duration::from_secs(10);
        let client = client_with_interval(&server, 3, interval);

        let start = tokio::time::Instant::now();
        let outcome = client.crawl("https://example.com").await.unwrap();

        assert!(!outcome.is_complete());
        assert!(start.elapsed() >= interval * 3);
    }

    #[tokio::test]
    async fn failed_status_checks_count_as_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-3"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/crawl/job-3"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let outcome = client_for(&server, 3).crawl("https://example.com").await.unwrap();
        assert!(matches!(outcome, CrawlOutcome::Incomplete { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = closed.local_addr().unwrap().port();
        drop(closed);

        let client = CrawlClient::new(
            Client::new(),
            CrawlConfig {
                api_key: "fc-test".to_string(),
                base_url: format!("http://127.0.0.1:{}", port),
                page_limit: 10,
                max_depth: 3,
                formats: CrawlConfig::default_formats(),
                poll_attempts: 1,
                poll_interval: Duration::from_millis(5),
            },
        );

        let err = client.crawl("https://example.com").await.unwrap_err();
        assert!(matches!(err, AppError::CrawlTransport(_)));
    }

    #[tokio::test]
    async fn rejected_submission_is_a_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server, 1).crawl("https://example.com").await.unwrap_err();
        match err {
            AppError::CrawlTransport(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid api key"));
            }
            other => panic!("expected a transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn submission_without_job_id_is_a_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/crawl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "scraping"})))
            .mount(&server)
            .await;

        let err = client_for(&server, 1).crawl("https://example.com").await.unwrap_err();
        assert!(matches!(err, AppError::CrawlService(_)));
    }
}
