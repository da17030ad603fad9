//! Coarse geolocation hook.

use async_trait::async_trait;

/// Geographic location resolved from a client address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 country code (e.g. "DE", "US")
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Looks up the location of a raw (unhashed) client address.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}

/// Lookup used when no GeoIP provider is wired in.
///
/// Country hints forwarded by the edge still apply; see
/// [`super::HeaderEnricher`].
pub struct NullGeoLookup;

#[async_trait]
impl GeoLookup for NullGeoLookup {
    async fn lookup(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
