use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::geo::Resolver;
use crate::middleware::client_ip;
use crate::rate_limiter::RateLimiter;
use crate::response::{HealthResponse, LocationResponse};

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Application state containing the rate limiter and the resolver
pub struct AppState {
    pub limiter: RateLimiter,
    pub resolver: Resolver,
}

#[derive(Debug, Deserialize)]
pub struct FindCountryParams {
    ip: Option<String>,
}

/// Resolve the location for the `ip` query parameter.
pub async fn find_country(
    State(state): State<SharedState>,
    Query(params): Query<FindCountryParams>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<LocationResponse>, ApiError> {
    let address = match params.ip.as_deref() {
        Some(ip) if !ip.is_empty() => ip,
        _ => return Err(ApiError::MissingIp),
    };

    // Callers are bucketed by who they are, not by what they look up.
    let client_key = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    if !state.limiter.allow(&client_key) {
        tracing::debug!(client = %client_key, "rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    let record = state.resolver.resolve(address).await?;
    tracing::debug!(
        ip = %address,
        country = %record.country,
        city = %record.city,
        "lookup hit"
    );

    Ok(Json(LocationResponse {
        country: record.country,
        city: record.city,
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracked_clients: state.limiter.tracked_clients(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<SharedState>) -> impl IntoResponse {
    if state.resolver.is_available().await {
        Json(serde_json::json!({
            "status": "ready",
            "database": "readable"
        }))
    } else {
        Json(serde_json::json!({
            "status": "ready",
            "database": "unreadable",
            "note": "lookups will answer IP not found"
        }))
    }
}
