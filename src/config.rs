use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::error::{AppError, Result};

const DEFAULT_CRAWL_API_URL: &str = "https://api.firecrawl.dev";
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:3000",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub crawl: CrawlConfig,
    pub llm: LlmConfig,
    pub cors_origins: CorsOrigins,
    /// File the latest crawl result is written to, when set.
    pub crawl_dump_path: Option<PathBuf>,
    /// Timeout applied to every outbound request. `None` leaves it to the services.
    pub http_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub api_key: String,
    pub base_url: String,
    pub page_limit: u32,
    pub max_depth: u32,
    pub formats: Vec<String>,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigins {
    /// `*` in the allow-list: echo back whatever origin asked.
    Any,
    List(Vec<HeaderValue>),
}

impl CrawlConfig {
    pub fn default_formats() -> Vec<String> {
        vec![
            "markdown".to_string(),
            "html".to_string(),
            "screenshot@fullPage".to_string(),
        ]
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let crawl_api_key = get("FIRECRAWL_API_KEY").ok_or_else(|| {
            AppError::Config(
                "FIRECRAWL_API_KEY environment variable is not set. Please set it before running the application."
                    .to_string(),
            )
        })?;
        let llm_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            AppError::Config("OPENAI_API_KEY environment variable is not set".to_string())
        })?;

        // Load server configuration with defaults
        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;
        let port: u16 = parse_or(&get, "PORT", 8000)?;

        let crawl = CrawlConfig {
            api_key: crawl_api_key,
            base_url: base_url(get("FIRECRAWL_API_URL"), DEFAULT_CRAWL_API_URL),
            page_limit: parse_or(&get, "CRAWL_PAGE_LIMIT", 10)?,
            max_depth: parse_or(&get, "CRAWL_MAX_DEPTH", 3)?,
            formats: CrawlConfig::default_formats(),
            poll_attempts: parse_or(&get, "CRAWL_POLL_ATTEMPTS", 7)?,
            poll_interval: Duration::from_secs(parse_or(&get, "CRAWL_POLL_INTERVAL_SECS", 10)?),
        };

        let llm = LlmConfig {
            api_key: llm_api_key,
            base_url: base_url(get("OPENAI_API_URL"), DEFAULT_LLM_API_URL),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", 500)?,
            temperature: parse_or(&get, "LLM_TEMPERATURE", 0.2)?,
        };

        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => parse_origins(raw.split(','))?,
            None => parse_origins(DEFAULT_CORS_ORIGINS.iter().copied())?,
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|e| {
                AppError::Config(format!("Invalid HTTP_TIMEOUT_SECS: {}", e))
            })?)),
            None => None,
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            crawl,
            llm,
            cors_origins,
            crawl_dump_path: get("CRAWL_DUMP_PATH").map(PathBuf::from),
            http_timeout,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

fn base_url(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn parse_origins<'a, I>(origins: I) -> Result<CorsOrigins>
where
    I: Iterator<Item = &'a str>,
{
    let mut list = Vec::new();
    for origin in origins.map(str::trim).filter(|o| !o.is_empty()) {
        if origin == "*" {
            return Ok(CorsOrigins::Any);
        }
        let value = HeaderValue::from_str(origin)
            .map_err(|e| AppError::Config(format!("Invalid CORS origin {:?}: {}", origin, e)))?;
        list.push(value);
    }
    Ok(CorsOrigins::List(list))
}
