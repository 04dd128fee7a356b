use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::api::models::{BrandKit, RootMessage, ScrapeRequest};
use crate::api::response;
use crate::config::CorsOrigins;
use crate::error::{AppError, Result};

pub fn create_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/scrape-details/", post(scrape_details))
        .route("/scrape-details", post(scrape_details))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    // Credentials rule out `*`, so methods and headers echo the preflight instead.
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::mirror_request(),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root() -> (StatusCode, Json<RootMessage>) {
    response::success(RootMessage {
        message: "Brand Kit Detail Scraper API is running!",
    })
}

async fn scrape_details(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BrandKit>)> {
    let Json(req) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let url = req.url.as_deref().unwrap_or("");
    if url.is_empty() {
        return Err(AppError::Validation("URL is required".to_string()));
    }

    tracing::info!(%url, "Processing scrape request");
    let start_time = std::time::Instant::now();

    let result = process_scrape_request(&state, url).await;

    tracing::info!(
        %url,
        elapsed = ?start_time.elapsed(),
        ok = result.is_ok(),
        "Scrape request finished"
    );
    result.map(response::success)
}

async fn process_scrape_request(state: &AppState, url: &str) -> Result<BrandKit> {
    let outcome = state.crawler.crawl(url).await?;

    if let Some(dump) = &state.crawl_dump {
        dump.record(url, &outcome).await;
    }
    if !outcome.is_complete() {
        tracing::warn!(%url, "Crawl did not finish, extracting from an empty site");
    }

    let site = outcome.into_site();
    let extraction = state.extractor.extract_brand_kit(&site).await?;

    Ok(BrandKit::from_fields(&extraction.into_fields()))
}
