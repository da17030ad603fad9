//! Handler for short URL redirect.

use axum::{
    Json,
    extract::{ConnectInfo, Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use std::time::Instant;

use crate::api::dto::redirect::PasswordRequiredResponse;
use crate::application::services::Resolution;
use crate::domain::entities::RedirectKind;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_signals::extract_signals;

/// Redirects a slug to its destination.
///
/// # Endpoint
///
/// `GET /{slug}[?pwd=...]`
///
/// # Request Flow
///
/// 1. Collect client signals (address, user agent, referrer, query)
/// 2. Resolve through [`crate::application::services::Resolver`] on a
///    detached task, so a client disconnect cannot cancel a counted click
/// 3. Answer 307 (expiring link) or 308 (permanent link)
///
/// # Responses
///
/// - **307 / 308**: redirect, `Location` set, no body
/// - **200**: `{"requiresPassword": true}` for protected links without `pwd`
/// - **400 / 401 / 404 / 410 / 503**: `{code, message}`, see [`AppError`]
///
/// Every response carries no-cache headers so intermediaries never replay a
/// redirect without it being counted, plus `X-Response-Time` and `X-Cache`.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let started = Instant::now();
    let password = query.as_deref().and_then(password_param);
    let signals = extract_signals(&headers, Some(addr), state.behind_proxy, query);

    let resolver = state.resolver.clone();
    let resolution = tokio::spawn(async move {
        resolver
            .resolve(&slug, password.as_deref(), signals)
            .await
    })
    .await
    .map_err(|e| AppError::internal(format!("Resolution task failed: {}", e)))??;

    let (mut response, cache_hit) = match resolution {
        Resolution::Redirect {
            destination,
            kind,
            cache_hit,
        } => {
            let redirect = match kind {
                RedirectKind::Temporary => Redirect::temporary(&destination),
                RedirectKind::Permanent => Redirect::permanent(&destination),
            };
            (redirect.into_response(), Some(cache_hit))
        }
        Resolution::PasswordRequired => (
            (
                StatusCode::OK,
                Json(PasswordRequiredResponse {
                    requires_password: true,
                }),
            )
                .into_response(),
            None,
        ),
    };

    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    if let Ok(elapsed) = HeaderValue::from_str(&format!(
        "{:.2}ms",
        started.elapsed().as_secs_f64() * 1000.0
    )) {
        headers.insert("x-response-time", elapsed);
    }
    if let Some(hit) = cache_hit {
        headers.insert(
            "x-cache",
            HeaderValue::from_static(if hit { "HIT" } else { "MISS" }),
        );
    }

    Ok(response)
}

/// First non-empty `pwd` query parameter.
fn password_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "pwd" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
