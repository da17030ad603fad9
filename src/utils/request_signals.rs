//! Client signal extraction from HTTP request headers.

use axum::http::{HeaderMap, HeaderName, header};
use std::net::SocketAddr;

use crate::domain::click_event::RequestSignals;

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
static CF_IPCOUNTRY: HeaderName = HeaderName::from_static("cf-ipcountry");
static X_COUNTRY_CODE: HeaderName = HeaderName::from_static("x-country-code");

/// Header values longer than this are truncated before they reach storage.
const MAX_HEADER_LENGTH: usize = 512;

/// Builds [`RequestSignals`] for a redirect request.
///
/// The client address comes from the socket unless `behind_proxy` is set, in
/// which case the first `X-Forwarded-For` entry (then `X-Real-IP`) wins.
/// Forwarded headers are ignored otherwise, since any client can send them.
/// The country hint is only read behind a proxy for the same reason.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let signals = extract_signals(&headers, Some(peer), true, None);
/// assert_eq!(signals.ip.as_deref(), Some("203.0.113.7"));
/// ```
pub fn extract_signals(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    behind_proxy: bool,
    query: Option<String>,
) -> RequestSignals {
    let forwarded_ip = if behind_proxy {
        forwarded_client_ip(headers)
    } else {
        None
    };

    let country_hint = if behind_proxy {
        header_str(headers, &CF_IPCOUNTRY)
            .or_else(|| header_str(headers, &X_COUNTRY_CODE))
            .filter(|code| code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()))
            .map(|code| code.to_ascii_uppercase())
    } else {
        None
    };

    RequestSignals {
        ip: forwarded_ip.or_else(|| peer.map(|addr| addr.ip().to_string())),
        user_agent: header_str(headers, &header::USER_AGENT),
        referer: header_str(headers, &header::REFERER),
        accept: header_str(headers, &header::ACCEPT),
        accept_language: header_str(headers, &header::ACCEPT_LANGUAGE),
        country_hint,
        query: query.filter(|q| !q.is_empty()),
    }
}

fn forwarded_client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, &X_FORWARDED_FOR)
        .and_then(|value| {
            value
                .split(',')
                .map(str::trim)
                .find(|entry| !entry.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_str(headers, &X_REAL_IP))
}

/// Non-empty, valid UTF-8 header value, truncated to [`MAX_HEADER_LENGTH`].
fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_HEADER_LENGTH).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("198.51.100.4:51000".parse().unwrap())
    }

    #[test]
    fn test_socket_address_without_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));

        let signals = extract_signals(&headers, peer(), false, None);
        assert_eq!(signals.ip.as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_forwarded_for_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        let signals = extract_signals(&headers, peer(), true, None);
        assert_eq!(signals.ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));

        let signals = extract_signals(&headers, None, true, None);
        assert_eq!(signals.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_browser_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
        headers.insert(header::REFERER, HeaderValue::from_static("https://t.co/x"));

        let signals = extract_signals(&headers, peer(), false, Some("utm_source=x".into()));
        assert_eq!(signals.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(signals.accept.as_deref(), Some("text/html"));
        assert_eq!(signals.accept_language.as_deref(), Some("en-US"));
        assert_eq!(signals.referer.as_deref(), Some("https://t.co/x"));
        assert_eq!(signals.query.as_deref(), Some("utm_source=x"));
    }

    #[test]
    fn test_country_hint_requires_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ipcountry", HeaderValue::from_static("de"));

        assert!(extract_signals(&headers, peer(), false, None).country_hint.is_none());
        assert_eq!(
            extract_signals(&headers, peer(), true, None).country_hint.as_deref(),
            Some("DE")
        );
    }

    #[test]
    fn test_empty_values_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("  "));

        let signals = extract_signals(&headers, None, false, Some(String::new()));
        assert!(signals.user_agent.is_none());
        assert!(signals.query.is_none());
        assert!(signals.ip.is_none());
    }

    #[test]
    fn test_long_values_are_truncated() {
        let long = "a".repeat(2000);
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let signals = extract_signals(&headers, None, false, None);
        assert_eq!(signals.user_agent.unwrap().len(), MAX_HEADER_LENGTH);
    }
}
