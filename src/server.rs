//! HTTP boundary.
//!
//! | Route | Method | Behavior |
//! |-------|--------|----------|
//! | `/` | GET | HTML list of articles from the last week |
//! | `/articles` | GET | Same list as JSON |
//! | `/` | POST | Bearer-authenticated check cycle |
//!
//! The check trigger answers `401` before any network work when the token is
//! wrong, `204` when nothing new was found, `200` after a digest was sent,
//! and `500` when the cycle failed.

use crate::error::Error;
use crate::models::Article;
use crate::notify::Notifier;
use crate::outputs::page::render_home;
use crate::scrapers::PageSource;
use crate::service::{CheckOutcome, DigestService, verify_bearer};
use crate::watermark::WatermarkStore;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

type Shared<S, W, N> = Arc<DigestService<S, W, N>>;

/// Build the router around a shared service.
pub fn router<S, W, N>(service: Shared<S, W, N>) -> Router
where
    S: PageSource + Send + Sync + 'static,
    W: WatermarkStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home::<S, W, N>).post(check::<S, W, N>))
        .route("/articles", get(articles::<S, W, N>))
        .with_state(service)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app).await
}

async fn home<S, W, N>(State(service): State<Shared<S, W, N>>) -> Response
where
    S: PageSource + Send + Sync + 'static,
    W: WatermarkStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let days = service.settings().lookback_days;
    match service.recent(days).await {
        Ok((articles, since)) => Html(render_home(&articles, since)).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn articles<S, W, N>(State(service): State<Shared<S, W, N>>) -> Response
where
    S: PageSource + Send + Sync + 'static,
    W: WatermarkStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let days = service.settings().lookback_days;
    match service.recent(days).await {
        Ok((articles, _since)) => Json::<Vec<Article>>(articles).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn check<S, W, N>(State(service): State<Shared<S, W, N>>, headers: HeaderMap) -> Response
where
    S: PageSource + Send + Sync + 'static,
    W: WatermarkStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if !verify_bearer(authorization, &service.settings().api_token) {
        warn!("Rejected check trigger: missing or invalid token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized - Invalid or missing token" })),
        )
            .into_response();
    }

    match service.check().await {
        Ok(CheckOutcome::NoNewArticles) => StatusCode::NO_CONTENT.into_response(),
        Ok(CheckOutcome::Notified { .. }) => {
            (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
        }
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: Error) -> Response {
    error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}
