use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    CrawlTransport(String),

    #[error("crawl service error: {0}")]
    CrawlService(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::CrawlTransport(_) => StatusCode::BAD_REQUEST,
            AppError::CrawlService(_) | AppError::Llm(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the `detail` field of the error body.
    pub fn detail(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::CrawlTransport(msg) => format!("Could not fetch website: {}", msg),
            other => format!("An unexpected error occurred: {}", other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Unexpected error during scraping");
        } else {
            tracing::warn!(error = %self, "Rejected scrape request");
        }

        response::error(status, self.detail()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
