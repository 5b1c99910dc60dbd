use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::auth::Principal;
use crate::error::AppError;
use crate::models::{CreateLinkRequest, CreateLinkResponse, HealthResponse};
use crate::redirect::ClickContext;
use crate::state::AppState;
use crate::validation::validate_target_url;

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn create_link(
    principal: Principal,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) =
        payload.map_err(|_| AppError::Validation("Invalid request body".into()))?;

    let raw_url = payload
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::Validation("URL is required".into()))?;
    // stored as submitted; parsing would normalise it (e.g. add a trailing slash)
    let target_url = raw_url.trim();
    validate_target_url(target_url)?;

    let link = state
        .allocator
        .create_link(&principal.id, target_url)
        .await?;

    info!(slug = %link.slug, owner_id = %link.owner_id, "short link created");

    let response = CreateLinkResponse {
        short_url: state.short_url(&link.slug),
        link,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn redirect_link(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let context = ClickContext {
        user_agent: header_value(header::USER_AGENT).unwrap_or_default(),
        referrer: header_value(header::REFERER),
    };

    let target_url = state.resolver.resolve(&slug, context).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, target_url)]))
}

pub async fn list_analytics(
    principal: Principal,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let links = state.analytics.list(&principal.id).await?;
    Ok(Json(links))
}
