#![forbid(unsafe_code)]

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::{Connection, OpenFlags};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tus_rehber_api::params::{parse_query_pairs, parse_search_params};
use tus_rehber_api::ApiError;
use tus_rehber_query::{compute_facets, search, QueryError, SearchLimits};

mod config;
mod facet_cache;
mod rate_limit;

pub use config::{ApiConfig, RateLimitConfig};

use facet_cache::FacetCache;
use rate_limit::RateLimiter;

pub const CRATE_NAME: &str = "tus-rehber-server";

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db_path: PathBuf,
    api: ApiConfig,
    limits: SearchLimits,
    facets: FacetCache,
    ip_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(db_path: PathBuf, api: ApiConfig) -> Self {
        let facets = FacetCache::new(api.facets_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                db_path,
                api,
                limits: SearchLimits::default(),
                facets,
                ip_limiter: RateLimiter::default(),
            }),
        }
    }
}

#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/facets", get(facets_handler))
        .route("/search", get(search_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({ "error": err }))).into_response()
}

fn put_cache_headers(headers: &mut HeaderMap, ttl: Duration) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert("cache-control", value);
    }
}

/// Client identity for rate limiting: first forwarded hop, then the
/// real-ip header, else a shared fallback key.
fn client_key(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real.trim().to_string();
    }
    "unknown".to_string()
}

fn open_read_only(path: &Path) -> Result<Connection, QueryError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| QueryError(e.to_string()))
}

/// Run a read-only query on a blocking worker; one connection per request,
/// no shared mutable state.
async fn run_query<T, F>(state: &AppState, f: F) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, QueryError> + Send + 'static,
{
    let path = state.inner.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let conn = open_read_only(&path)?;
        f(&conn)
    })
    .await
    .map_err(|e| QueryError(e.to_string()))?
}

async fn facets_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state
        .inner
        .ip_limiter
        .allow(&client_key(&headers), &state.inner.api.rate_limit_per_ip)
        .await
    {
        return api_error_response(StatusCode::TOO_MANY_REQUESTS, ApiError::rate_limited("ip"));
    }

    let facets = if let Some(cached) = state.inner.facets.get().await {
        cached
    } else {
        match run_query(&state, compute_facets).await {
            Ok(fresh) => {
                state.inner.facets.put(fresh.clone()).await;
                fresh
            }
            Err(e) => {
                error!("facets unavailable: {e}");
                return api_error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal(),
                );
            }
        }
    };

    let mut response = (StatusCode::OK, Json(facets)).into_response();
    put_cache_headers(response.headers_mut(), state.inner.api.facets_ttl);
    response
}

async fn search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Response {
    if !state
        .inner
        .ip_limiter
        .allow(&client_key(&headers), &state.inner.api.rate_limit_per_ip)
        .await
    {
        return api_error_response(StatusCode::TOO_MANY_REQUESTS, ApiError::rate_limited("ip"));
    }

    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let spec = match parse_search_params(&pairs) {
        Ok(spec) => spec,
        Err(e) => return api_error_response(StatusCode::BAD_REQUEST, e),
    };

    let limits = state.inner.limits.clone();
    let result = match run_query(&state, move |conn| search(conn, &spec, &limits)).await {
        Ok(result) => result,
        Err(e) => {
            error!("search query failed: {e}");
            return api_error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal());
        }
    };

    info!(
        total = result.total,
        page = result.page,
        rows = result.rows.len(),
        "search served"
    );

    let total = result.total;
    let mut response = (StatusCode::OK, Json(result)).into_response();
    put_cache_headers(response.headers_mut(), state.inner.api.search_ttl);
    if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
        response.headers_mut().insert("x-total-count", value);
    }
    response
}
