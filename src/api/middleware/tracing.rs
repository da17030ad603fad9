//! HTTP request/response tracing middleware.
//!
//! Spans carry the request path but never the query string: redirect
//! queries may hold a link password (`?pwd=`).

use axum::http::{HeaderMap, Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, MakeSpan, OnResponse, TraceLayer};
use tracing::field::Empty;
use tracing::{Span, info, warn};

/// Opens one `request` span per HTTP request.
///
/// `status`, `cache` and `latency_ms` start empty and are filled in by
/// [`RedirectOutcome`] once the response is ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            status = Empty,
            cache = Empty,
            latency_ms = Empty,
        )
    }
}

/// Records the response status, the `X-Cache` outcome and the latency.
///
/// Server errors log at `WARN`, everything else at `INFO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectOutcome;

impl<B> OnResponse<B> for RedirectOutcome {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        let cache = cache_outcome(response.headers());
        let latency_ms = latency.as_millis() as u64;

        span.record("status", status.as_u16());
        span.record("cache", cache);
        span.record("latency_ms", latency_ms);

        if status.is_server_error() {
            warn!("Response {} in {}ms", status, latency_ms);
        } else {
            info!("Response {} in {}ms (cache {})", status, latency_ms, cache);
        }
    }
}

/// `HIT` / `MISS` from the redirect handler, `-` for every other route.
pub fn cache_outcome(headers: &HeaderMap) -> &str {
    headers
        .get("x-cache")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

/// Creates the tracing middleware for HTTP requests.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=GET path=/promo-2024 status=308 cache=HIT latency_ms=1}: Response 308 Permanent Redirect in 1ms (cache HIT)
/// WARN request{method=GET path=/slow status=503 cache=- latency_ms=301}: Response 503 Service Unavailable in 301ms
/// ```
pub fn layer()
-> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, DefaultOnRequest, RedirectOutcome>
{
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(RedirectOutcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cache_outcome() {
        let mut headers = HeaderMap::new();
        assert_eq!(cache_outcome(&headers), "-");

        headers.insert("x-cache", HeaderValue::from_static("HIT"));
        assert_eq!(cache_outcome(&headers), "HIT");
    }

    #[tokio::test]
    async fn test_layer_passes_responses_through() {
        use axum::{Router, routing::get};
        use axum_test::TestServer;

        let app = Router::new()
            .route("/{slug}", get(|| async { ([("x-cache", "MISS")], "ok") }))
            .layer(layer());
        let server = TestServer::new(app).unwrap();

        let response = server.get("/vip?pwd=secret123").await;

        response.assert_status_ok();
        assert_eq!(response.header("x-cache"), "MISS");
    }
}
